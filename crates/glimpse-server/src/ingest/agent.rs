use woothee::parser::Parser;

/// Browser, device class and operating system derived from a user agent.
/// Unknown parts are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentInfo {
    pub browser: String,
    pub device: String,
    pub operating_system: String,
}

pub trait AgentClassifier: Send + Sync + 'static {
    fn classify(&self, user_agent: &str) -> AgentInfo;
}

/// woothee reports unknown fields with this marker.
const WOOTHEE_UNKNOWN: &str = "UNKNOWN";

pub struct WootheeClassifier {
    parser: Parser,
}

impl WootheeClassifier {
    pub fn new() -> Self {
        Self {
            parser: Parser::new(),
        }
    }
}

impl Default for WootheeClassifier {
    fn default() -> Self {
        Self::new()
    }
}

fn known(value: &str) -> String {
    if value == WOOTHEE_UNKNOWN {
        String::new()
    } else {
        value.to_string()
    }
}

/// Map woothee categories onto the device classes shown in reports:
///   "pc"                         → "desktop"
///   "smartphone" / "mobilephone" → "mobile"
///   anything else is kept ("appliance", "crawler", "misc")
fn device_class(category: &str) -> String {
    match category {
        "pc" => "desktop".to_string(),
        "smartphone" | "mobilephone" => "mobile".to_string(),
        other => known(other),
    }
}

impl AgentClassifier for WootheeClassifier {
    fn classify(&self, user_agent: &str) -> AgentInfo {
        if user_agent.trim().is_empty() {
            return AgentInfo::default();
        }
        match self.parser.parse(user_agent) {
            Some(result) => AgentInfo {
                browser: known(result.name),
                device: device_class(result.category),
                operating_system: known(result.os),
            },
            None => AgentInfo::default(),
        }
    }
}
