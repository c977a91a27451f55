use serde::{Deserialize, Serialize};

use crate::data_handling::{AttributeType, MetaData};
use crate::expression::{get_bool_argument, Arguments};
use crate::models::rule_model::{Comparator, Condition, Head, RuleModel};

/// Options for rendering rule models as text.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct PrintOptions {
    pub print_feature_names: bool,
    pub print_label_names: bool,
    pub print_nominal_values: bool,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self {
            print_feature_names: true,
            print_label_names: true,
            print_nominal_values: true,
        }
    }
}

impl PrintOptions {
    /// Reads the options from a literal mapping, e.g. `{'print_label_names': False}`.
    pub fn from_arguments(args: &Arguments) -> Self {
        let default = Self::default();
        Self {
            print_feature_names: get_bool_argument(
                args,
                "print_feature_names",
                default.print_feature_names,
            ),
            print_label_names: get_bool_argument(args, "print_label_names", default.print_label_names),
            print_nominal_values: get_bool_argument(
                args,
                "print_nominal_values",
                default.print_nominal_values,
            ),
        }
    }
}

/// Renders a rule model, one rule per line:
/// `{feature <= 0.5 & other == value} => (label = 1.0)`.
pub struct RuleModelFormatter<'a> {
    meta_data: &'a MetaData,
    options: PrintOptions,
}

impl<'a> RuleModelFormatter<'a> {
    pub fn new(meta_data: &'a MetaData, options: PrintOptions) -> Self {
        Self { meta_data, options }
    }

    pub fn format(&self, model: &RuleModel) -> String {
        let mut text = String::new();

        for rule in model.used_rules() {
            let body: Vec<String> = rule.body.iter().map(|c| self.format_condition(c)).collect();
            text.push('{');
            text.push_str(&body.join(" & "));
            text.push_str("} => (");
            text.push_str(&self.format_head(&rule.head));
            text.push_str(")\n");
        }

        text
    }

    fn format_condition(&self, condition: &Condition) -> String {
        let attribute = self.meta_data.attributes.get(condition.feature_index as usize);
        let name = match attribute {
            Some(a) if self.options.print_feature_names => a.name.clone(),
            _ => condition.feature_index.to_string(),
        };

        let value = match attribute {
            Some(a)
                if self.options.print_nominal_values
                    && a.attribute_type == AttributeType::Nominal
                    && matches!(condition.comparator, Comparator::Eq | Comparator::Neq) =>
            {
                a.nominal_values
                    .get(condition.threshold as usize)
                    .cloned()
                    .unwrap_or_else(|| condition.threshold.to_string())
            }
            _ => condition.threshold.to_string(),
        };

        format!("{} {} {}", name, condition.comparator.symbol(), value)
    }

    fn format_head(&self, head: &Head) -> String {
        head.entries()
            .into_iter()
            .map(|(label, score)| {
                let name = match self.meta_data.labels.get(label as usize) {
                    Some(name) if self.options.print_label_names => name.clone(),
                    _ => label.to_string(),
                };
                format!("{} = {:?}", name, score)
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}
