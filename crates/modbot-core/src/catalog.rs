//! Localized reply templates used when composing bot comments.

/// Message templates for every reply the bot can post. `{}` marks the
/// percentage slot in the report and taunt templates. Defaults are the
/// Russian texts the bot ships with; deployments may override any of them.
#[derive(Debug, Clone)]
pub struct MessageCatalog {
    pub toxicity_report: String,
    pub could_not_compute: String,
    pub weekend_taunt: String,
    pub harassment_notice: String,
    /// Fixed set of escalation remarks appended to high-toxicity reports.
    pub escalation_remarks: Vec<String>,
}

impl Default for MessageCatalog {
    fn default() -> Self {
        Self {
            toxicity_report: "Этот коммент токсичен с вероятностью {}%".to_string(),
            could_not_compute: "Я не смог посчитать токсичность".to_string(),
            weekend_taunt: "Этот коммент токсичен с вероятностью {}%. Хорошей субботы!"
                .to_string(),
            harassment_notice:
                "Травля бота нарушает правила площадки. Это автоматическое предупреждение."
                    .to_string(),
            escalation_remarks: vec![
                "Советую всем остыть.".to_string(),
                "Это уже перебор.".to_string(),
                "Кажется, сюда нужен модератор.".to_string(),
            ],
        }
    }
}

impl MessageCatalog {
    pub fn render_report(&self, percent: i64) -> String {
        render_percent(&self.toxicity_report, percent)
    }

    pub fn render_taunt(&self, percent: i64) -> String {
        render_percent(&self.weekend_taunt, percent)
    }

    pub fn escalation_remark(&self, index: usize) -> Option<&str> {
        self.escalation_remarks.get(index).map(String::as_str)
    }
}

fn render_percent(template: &str, percent: i64) -> String {
    template.replacen("{}", &percent.to_string(), 1)
}
