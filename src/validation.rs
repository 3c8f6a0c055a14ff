//! 组件模型校验

use std::collections::BTreeMap;
use std::fmt;

use crate::model::ComponentModel;

/// 按字段归类的校验消息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResults {
    fields: BTreeMap<String, Vec<String>>,
}

impl ValidationResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) -> &mut Self {
        self.fields
            .entry(field.into())
            .or_default()
            .push(message.into());
        self
    }

    pub fn is_valid(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, name: &str) -> Option<&[String]> {
        self.fields.get(name).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields
            .iter()
            .map(|(field, messages)| (field.as_str(), messages.as_slice()))
    }
}

impl fmt::Display for ValidationResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .iter()
            .map(|(field, messages)| format!("{field}: {}", messages.join(", ")))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

pub trait Validator: Send + Sync {
    fn validate(&self, model: &ComponentModel) -> ValidationResults;
}

/// 默认校验：键与工厂必须可确定，Every 不能与 Child 组合
#[derive(Debug, Default, Clone, Copy)]
pub struct ModelValidator;

impl Validator for ModelValidator {
    fn validate(&self, model: &ComponentModel) -> ValidationResults {
        let mut results = ValidationResults::new();
        if !model.key_can_be_determined() {
            results.add("key", "Key could not be determined");
        }
        if !model.factory_can_be_determined() {
            results.add("factory", "Factory could not be determined");
        }
        for location in model.every_child_violations() {
            results.add("dependencies", format!("{location} combines Every with Child"));
        }
        results
    }
}
