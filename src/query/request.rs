use serde_json::Value;

use super::is_identifier;

/// Control keys consumed by the plan itself; never filter fields.
pub const RESERVED_KEYS: [&str; 4] = ["select", "sort", "page", "limit"];

/// Comparison operator carried by a filter pair, written as a bracketed
/// key suffix: `tuition[lte]=10000`. A bare key means equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
}

impl Comparison {
    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "gt" => Some(Comparison::Gt),
            "gte" => Some(Comparison::Gte),
            "lt" => Some(Comparison::Lt),
            "lte" => Some(Comparison::Lte),
            "in" => Some(Comparison::In),
            _ => None,
        }
    }
}

/// One filter condition: field, operator and the raw value(s).
///
/// Values stay strings end to end; the storage layer decides how to coerce
/// them per column. `In` carries an array, everything else a single string.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: String,
    pub op: Comparison,
    pub value: Value,
}

/// The raw `(key, value)` pairs of an inbound query string, in request order.
///
/// Built with `form_urlencoded` rather than a map extractor so repeated keys
/// survive (`careers[in]=a&careers[in]=b`) and bracketed keys arrive intact.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterRequest {
    pairs: Vec<(String, String)>,
}

impl FilterRequest {
    pub fn parse(raw_query: &str) -> Self {
        let pairs = url::form_urlencoded::parse(raw_query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Self { pairs }
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Last occurrence of a reserved control key, if any.
    pub fn control(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Translate the non-reserved pairs into filter conditions.
    ///
    /// Operator suffixes are matched per key, so operator words inside a
    /// *value* (`description=This is great tuition`) are never touched.
    /// Pairs whose field is not a plain identifier, and bracketed suffixes
    /// outside the supported set, are dropped. `in` values split on commas
    /// and repeated `in` keys for the same field accumulate into one list.
    pub fn conditions(&self) -> Vec<Condition> {
        let mut out: Vec<Condition> = Vec::new();
        for (key, value) in &self.pairs {
            if RESERVED_KEYS.contains(&key.as_str()) {
                continue;
            }
            let Some((field, op)) = split_operator(key) else {
                continue;
            };
            if !is_identifier(field) {
                continue;
            }
            match op {
                Comparison::In => {
                    let items: Vec<Value> =
                        value.split(',').map(|v| Value::String(v.to_string())).collect();
                    match out
                        .iter_mut()
                        .find(|c| c.op == Comparison::In && c.field == field)
                    {
                        Some(Condition {
                            value: Value::Array(list),
                            ..
                        }) => list.extend(items),
                        _ => out.push(Condition {
                            field: field.to_string(),
                            op,
                            value: Value::Array(items),
                        }),
                    }
                }
                _ => out.push(Condition {
                    field: field.to_string(),
                    op,
                    value: Value::String(value.clone()),
                }),
            }
        }
        out
    }
}

/// Split `field[op]` into its parts. A key without brackets is an equality
/// filter; a bracketed but unrecognized suffix makes the pair unusable.
fn split_operator(key: &str) -> Option<(&str, Comparison)> {
    match key.find('[') {
        None => Some((key, Comparison::Eq)),
        Some(open) if key.ends_with(']') => {
            let suffix = &key[open + 1..key.len() - 1];
            Comparison::from_suffix(suffix).map(|op| (&key[..open], op))
        }
        Some(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_key_is_equality() {
        let req = FilterRequest::parse("housing=true");
        let conds = req.conditions();
        assert_eq!(conds.len(), 1);
        assert_eq!(conds[0].field, "housing");
        assert_eq!(conds[0].op, Comparison::Eq);
        assert_eq!(conds[0].value, json!("true"));
    }

    #[test]
    fn bracket_suffix_selects_operator() {
        let req = FilterRequest::parse("averageCost[lte]=10000&tuition[gt]=4000");
        let conds = req.conditions();
        assert_eq!(conds.len(), 2);
        assert_eq!(conds[0].field, "averageCost");
        assert_eq!(conds[0].op, Comparison::Lte);
        assert_eq!(conds[1].op, Comparison::Gt);
        assert_eq!(conds[1].value, json!("4000"));
    }

    #[test]
    fn operator_words_inside_values_are_untouched() {
        let req = FilterRequest::parse("description=costs+lt+average+in+town");
        let conds = req.conditions();
        assert_eq!(conds.len(), 1);
        assert_eq!(conds[0].op, Comparison::Eq);
        assert_eq!(conds[0].value, json!("costs lt average in town"));
    }

    #[test]
    fn in_splits_commas_and_merges_repeats() {
        let req = FilterRequest::parse("careers[in]=Business,UI/UX&careers[in]=Data+Science");
        let conds = req.conditions();
        assert_eq!(conds.len(), 1);
        assert_eq!(conds[0].op, Comparison::In);
        assert_eq!(conds[0].value, json!(["Business", "UI/UX", "Data Science"]));
    }

    #[test]
    fn reserved_keys_are_not_filters() {
        let req = FilterRequest::parse("select=name&sort=-rating&page=2&limit=5&city=Boston");
        let conds = req.conditions();
        assert_eq!(conds.len(), 1);
        assert_eq!(conds[0].field, "city");
    }

    #[test]
    fn hostile_or_malformed_fields_are_dropped() {
        let req = FilterRequest::parse(
            "name;drop=x&1bad=2&price%5Blike%5D=9&broken%5Bgt=1&ok=yes",
        );
        let conds = req.conditions();
        assert_eq!(conds.len(), 1);
        assert_eq!(conds[0].field, "ok");
    }

    #[test]
    fn control_takes_last_occurrence() {
        let req = FilterRequest::parse("page=2&page=7");
        assert_eq!(req.control("page"), Some("7"));
        assert_eq!(req.control("sort"), None);
    }
}
