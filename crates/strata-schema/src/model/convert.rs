use strata_core::{DEFAULT_STRING_LEN, value::FieldType};

use crate::model::Column;

///
/// Convertibility
///
/// Whether a live column can become the desired one in place.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Convertibility {
    /// Lossless; always allowed.
    Ok,
    /// Possible but lossy (size or rank shrink, sign loss). Allowed only
    /// behind the explicit opt-in.
    Narrowing,
    /// No in-place conversion exists.
    Incompatible,
}

/// Classify an in-place type change from `from` to `to`.
pub(crate) fn convertible(from: &Column, to: &Column) -> Convertibility {
    use Convertibility::{Incompatible, Narrowing, Ok};

    let (f, t) = (from.ty, to.ty);
    if f == t {
        return if effective_size(from) <= effective_size(to) {
            Ok
        } else {
            Narrowing
        };
    }
    match (f, t) {
        // Within one integer family, width decides.
        _ if (f.is_int() && t.is_int()) || (f.is_uint() && t.is_uint()) => rank_widens(f, t),
        // Unsigned fits in a signed column of at least the same width.
        _ if f.is_uint() && t.is_int() => rank_widens(f, t),
        // Signed into unsigned loses the sign.
        _ if f.is_int() && t.is_uint() => Narrowing,
        (FieldType::String, FieldType::Enum) | (FieldType::Enum, FieldType::String) => Ok,
        _ if (f.is_int() || f.is_uint()) && t == FieldType::String => Ok,
        (FieldType::F32, FieldType::F64) => Ok,
        (FieldType::F64, FieldType::F32) => Narrowing,
        _ => Incompatible,
    }
}

fn rank_widens(f: FieldType, t: FieldType) -> Convertibility {
    match (f.int_rank(), t.int_rank()) {
        (Some(from), Some(to)) if from <= to => Convertibility::Ok,
        (Some(_), Some(_)) => Convertibility::Narrowing,
        _ => Convertibility::Incompatible,
    }
}

fn effective_size(col: &Column) -> u64 {
    col.size.unwrap_or(match col.ty {
        FieldType::String | FieldType::Enum => DEFAULT_STRING_LEN,
        _ => 0,
    })
}
