use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::ids::{ContractId, TemplateId};
use crate::party::Party;
use crate::time::Timestamp;

/// A contract argument or key value.
///
/// Values are trees: composites carry further values, leaves terminate.
/// Numerics are carried textually so values stay `Eq`/`Ord` and usable as
/// key material.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Value {
    Unit,
    Bool(bool),
    Int64(i64),
    Numeric(String),
    Text(String),
    /// Days since the UNIX epoch.
    Date(i32),
    Timestamp(Timestamp),
    Party(Party),
    ContractId(ContractId),
    Enum {
        constructor: String,
    },
    Record {
        fields: Vec<(String, Value)>,
    },
    /// Structural tuple: positional fields without a template.
    Struct {
        fields: Vec<Value>,
    },
    Variant {
        constructor: String,
        value: Box<Value>,
    },
    List(Vec<Value>),
    Optional(Option<Box<Value>>),
    TextMap(BTreeMap<String, Value>),
    /// General map; both key and value sides are full values.
    GenMap(Vec<(Value, Value)>),
}

impl Value {
    /// All contract ids transitively reachable inside this value.
    pub fn contract_ids(&self) -> BTreeSet<ContractId> {
        let mut acc = BTreeSet::new();
        self.collect_contract_ids(&mut acc);
        acc
    }

    // Total over every value shape: the match is exhaustive on purpose, so
    // adding a composite without visiting its children fails to compile
    // rather than silently under-reporting divulgence.
    fn collect_contract_ids(&self, acc: &mut BTreeSet<ContractId>) {
        match self {
            Value::ContractId(coid) => {
                acc.insert(coid.clone());
            }
            Value::Unit
            | Value::Bool(_)
            | Value::Int64(_)
            | Value::Numeric(_)
            | Value::Text(_)
            | Value::Date(_)
            | Value::Timestamp(_)
            | Value::Party(_)
            | Value::Enum { .. } => {}
            Value::Record { fields } => {
                for (_, value) in fields {
                    value.collect_contract_ids(acc);
                }
            }
            Value::Struct { fields } => {
                for value in fields {
                    value.collect_contract_ids(acc);
                }
            }
            Value::Variant { value, .. } => value.collect_contract_ids(acc),
            Value::List(items) => {
                for value in items {
                    value.collect_contract_ids(acc);
                }
            }
            Value::Optional(inner) => {
                if let Some(value) = inner {
                    value.collect_contract_ids(acc);
                }
            }
            Value::TextMap(entries) => {
                for value in entries.values() {
                    value.collect_contract_ids(acc);
                }
            }
            Value::GenMap(entries) => {
                for (key, value) in entries {
                    key.collect_contract_ids(acc);
                    value.collect_contract_ids(acc);
                }
            }
        }
    }
}

/// A contract key scoped to its template.
///
/// At most one *active* contract may carry a given global key; the commit
/// processor enforces this.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GlobalKey {
    pub template_id: TemplateId,
    pub key: Value,
}

impl GlobalKey {
    pub fn new(template_id: TemplateId, key: Value) -> Self {
        Self { template_id, key }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coid(s: &str) -> ContractId {
        ContractId::new(s)
    }

    fn coids(names: &[&str]) -> BTreeSet<ContractId> {
        names.iter().map(|n| coid(n)).collect()
    }

    #[test]
    fn leaves_contribute_nothing() {
        for leaf in [
            Value::Unit,
            Value::Bool(true),
            Value::Int64(-3),
            Value::Numeric("1.5".into()),
            Value::Text("#0:0".into()),
            Value::Date(19_000),
            Value::Timestamp(Timestamp::from_micros(1)),
            Value::Party(Party::new("Alice")),
            Value::Enum {
                constructor: "Red".into(),
            },
        ] {
            assert!(leaf.contract_ids().is_empty(), "leaf {leaf:?}");
        }
    }

    #[test]
    fn contract_id_leaf_is_collected() {
        assert_eq!(
            Value::ContractId(coid("#0:1")).contract_ids(),
            coids(&["#0:1"])
        );
    }

    #[test]
    fn composites_are_walked_recursively() {
        let value = Value::Record {
            fields: vec![
                ("owner".into(), Value::Party(Party::new("Alice"))),
                ("ref".into(), Value::ContractId(coid("#1:0"))),
                (
                    "nested".into(),
                    Value::Variant {
                        constructor: "Some".into(),
                        value: Box::new(Value::List(vec![
                            Value::Optional(Some(Box::new(Value::ContractId(coid("#2:0"))))),
                            Value::Struct {
                                fields: vec![Value::ContractId(coid("#1:0"))],
                            },
                        ])),
                    },
                ),
            ],
        };
        assert_eq!(value.contract_ids(), coids(&["#1:0", "#2:0"]));
    }

    #[test]
    fn gen_map_walks_both_sides() {
        let value = Value::GenMap(vec![(
            Value::ContractId(coid("#3:0")),
            Value::ContractId(coid("#3:1")),
        )]);
        assert_eq!(value.contract_ids(), coids(&["#3:0", "#3:1"]));
    }

    #[test]
    fn text_map_walks_values() {
        let mut entries = BTreeMap::new();
        entries.insert("a".to_string(), Value::ContractId(coid("#4:0")));
        entries.insert("b".to_string(), Value::Unit);
        assert_eq!(Value::TextMap(entries).contract_ids(), coids(&["#4:0"]));
    }

    #[test]
    fn empty_optional_and_list() {
        assert!(Value::Optional(None).contract_ids().is_empty());
        assert!(Value::List(vec![]).contract_ids().is_empty());
    }

    #[test]
    fn global_keys_are_template_scoped() {
        let k1 = GlobalKey::new(TemplateId::new("Iou"), Value::Text("acct-1".into()));
        let k2 = GlobalKey::new(TemplateId::new("Account"), Value::Text("acct-1".into()));
        assert_ne!(k1, k2);
    }

    #[test]
    fn serde_roundtrip() {
        let value = Value::Record {
            fields: vec![("ref".into(), Value::ContractId(coid("#0:0")))],
        };
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(value, serde_json::from_str::<Value>(&json).unwrap());
    }
}
