//! Comparator/value encoding for value filters
//!
//! Maps (comparator, typed value) pairs onto FHIR search prefix+value
//! syntax. Search prefixes only apply to numbers, dates, and quantities;
//! booleans and strings support plain equality. Combinations outside the
//! table encode to nothing: a dropped condition broadens the query, an
//! invented one could corrupt it.

use octofhir_fqm_types::{Comparator, Quantity, ValueFilter};

/// Encode one value filter against its resolved search parameter.
///
/// The filter's value fields are checked in fixed priority order (boolean,
/// string, integer, quantity, ratio, range); the first usable field
/// determines the encoding path.
pub fn encode_value(param: &str, filter: &ValueFilter) -> Vec<String> {
    let comparator = filter.comparator;

    if let Some(value) = filter.value_boolean {
        return match comparator {
            Comparator::Eq => vec![format!("{param}={value}")],
            _ => Vec::new(),
        };
    }

    if let Some(value) = &filter.value_string {
        return match comparator {
            Comparator::Eq => vec![format!("{param}={value}")],
            _ => Vec::new(),
        };
    }

    if let Some(value) = filter.value_integer {
        // starts-after and ends-before have no meaning for discrete integers
        return match comparator {
            Comparator::Sa | Comparator::Eb => Vec::new(),
            _ => vec![format!("{param}={comparator}{value}")],
        };
    }

    // [parameter]=[prefix][number]|[system]|[code]
    if let Some(quantity) = &filter.value_quantity {
        if let Some(value) = quantity.value {
            return vec![format!(
                "{param}={comparator}{value}{}",
                unit_suffix(quantity)
            )];
        }
    }

    // A ratio is encoded as the quantity numerator/denominator, which only
    // makes sense when both sides carry identical units.
    if let Some(ratio) = &filter.value_ratio {
        if let (Some(numerator), Some(denominator)) =
            (ratio.numerator.as_ref(), ratio.denominator.as_ref())
        {
            if let (Some(num), Some(den)) = (numerator.value, denominator.value) {
                if numerator.system != denominator.system || numerator.code != denominator.code {
                    return Vec::new();
                }
                let Some(value) = num.checked_div(den) else {
                    return Vec::new();
                };
                return vec![format!(
                    "{param}={comparator}{}{}",
                    value.normalize(),
                    unit_suffix(numerator)
                )];
            }
        }
    }

    if let Some(range) = &filter.value_range {
        return match comparator {
            // eq: the search range must fully contain the target range,
            // bounds inclusive.
            Comparator::Eq => {
                let mut fragments = Vec::new();
                if let Some(low) = &range.low {
                    if let Some(value) = low.value {
                        fragments.push(format!("{param}=ge{value}{}", unit_suffix(low)));
                    }
                }
                if let Some(high) = &range.high {
                    if let Some(value) = high.value {
                        fragments.push(format!("{param}=le{value}{}", unit_suffix(high)));
                    }
                }
                fragments
            }
            // Interval prefixes over a range-valued target have no settled
            // encoding; emit nothing.
            Comparator::Gt
            | Comparator::Lt
            | Comparator::Ge
            | Comparator::Le
            | Comparator::Sa
            | Comparator::Eb => Vec::new(),
        };
    }

    Vec::new()
}

/// Optional `|system` and `|code` segments of a quantity encoding, each
/// included only when present
fn unit_suffix(quantity: &Quantity) -> String {
    let mut suffix = String::new();
    if let Some(system) = &quantity.system {
        suffix.push('|');
        suffix.push_str(system);
    }
    if let Some(code) = &quantity.code {
        suffix.push('|');
        suffix.push_str(code);
    }
    suffix
}
