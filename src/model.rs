use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Marker left in the documented default endpoint; an endpoint containing it was never configured.
pub const ENDPOINT_PLACEHOLDER_MARKER: &str = "YOUR_DEPLOYMENT_ID";

pub const DEFAULT_ENDPOINT: &str = "https://script.google.com/macros/s/YOUR_DEPLOYMENT_ID/exec";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub endpoint: String,
    pub user_agent: String,
    pub busy_style: BusyStyle,
}

/// How the form signals an in-flight submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum BusyStyle {
    /// Keep the form visible and grey out both action buttons
    #[default]
    DisableButtons,
    /// Hide the whole form behind the loading indicator
    HideForm,
}

/// One entry of an option list as delivered by the endpoint.
///
/// Operators and phases usually arrive as bare labels, commissions as
/// `{ "value": .., "text": .. }` pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SelectOption {
    Label(String),
    Pair { value: String, text: String },
}

impl SelectOption {
    pub fn value(&self) -> &str {
        match self {
            SelectOption::Label(label) => label,
            SelectOption::Pair { value, .. } => value,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            SelectOption::Label(label) => label,
            SelectOption::Pair { text, .. } => text,
        }
    }
}

fn scalar_to_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl TryFrom<Value> for SelectOption {
    type Error = String;

    fn try_from(v: Value) -> Result<Self, Self::Error> {
        if let Some(label) = scalar_to_string(&v) {
            return Ok(SelectOption::Label(label));
        }
        let Value::Object(map) = &v else {
            return Err(format!("unsupported option entry: {v}"));
        };
        let value = map
            .get("value")
            .and_then(scalar_to_string)
            .ok_or_else(|| format!("option object without a usable value: {v}"))?;
        let text = map
            .get("text")
            .and_then(scalar_to_string)
            .unwrap_or_else(|| value.clone());
        Ok(SelectOption::Pair { value, text })
    }
}

impl<'de> Deserialize<'de> for SelectOption {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let v = Value::deserialize(deserializer)?;
        SelectOption::try_from(v).map_err(serde::de::Error::custom)
    }
}

/// Option lists used to populate the three selection inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitialData {
    #[serde(default)]
    pub operatori: Vec<SelectOption>,
    #[serde(default)]
    pub commesse: Vec<SelectOption>,
    #[serde(default)]
    pub fasi: Vec<SelectOption>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "camelCase")]
pub enum WorkAction {
    #[value(name = "start")]
    StartWork,
    #[value(name = "end")]
    EndWork,
}

impl WorkAction {
    pub fn as_wire_str(self) -> &'static str {
        match self {
            WorkAction::StartWork => "startWork",
            WorkAction::EndWork => "endWork",
        }
    }
}

/// Body of the write call. Field names follow the endpoint's wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub action: WorkAction,
    #[serde(rename = "operatore")]
    pub operator: String,
    #[serde(rename = "codiceCommessa")]
    pub commission_code: String,
    #[serde(rename = "fase")]
    pub phase: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeStatus {
    Success,
    Error,
}

/// Response shape shared by both endpoint calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub status: EnvelopeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// The three selection inputs of the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Operator,
    Commission,
    Phase,
}

impl Field {
    pub const ALL: [Field; 3] = [Field::Operator, Field::Commission, Field::Phase];

    pub fn index(self) -> usize {
        match self {
            Field::Operator => 0,
            Field::Commission => 1,
            Field::Phase => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Field::Operator => "Operator",
            Field::Commission => "Commission",
            Field::Phase => "Phase",
        }
    }

    pub fn placeholder(self) -> &'static str {
        match self {
            Field::Operator => "Select operator",
            Field::Commission => "Select commission",
            Field::Phase => "Select phase",
        }
    }

    pub fn options(self, data: &InitialData) -> &[SelectOption] {
        match self {
            Field::Operator => &data.operatori,
            Field::Commission => &data.commesse,
            Field::Phase => &data.fasi,
        }
    }
}

/// Current values of the three selection inputs. `None` or `""` means unselected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub operator: Option<String>,
    pub commission: Option<String>,
    pub phase: Option<String>,
}

impl Selection {
    pub fn get(&self, field: Field) -> Option<&str> {
        let v = match field {
            Field::Operator => &self.operator,
            Field::Commission => &self.commission,
            Field::Phase => &self.phase,
        };
        v.as_deref().filter(|s| !s.is_empty())
    }

    pub fn missing_fields(&self) -> Vec<Field> {
        Field::ALL
            .into_iter()
            .filter(|f| self.get(*f).is_none())
            .collect()
    }

    /// Build the request for `action`, or `None` if any field is unselected.
    pub fn to_request(&self, action: WorkAction) -> Option<ActionRequest> {
        Some(ActionRequest {
            action,
            operator: self.get(Field::Operator)?.to_string(),
            commission_code: self.get(Field::Commission)?.to_string(),
            phase: self.get(Field::Phase)?.to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    Success,
    Error,
}

/// One row of a populated selection input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectEntry {
    pub value: String,
    pub label: String,
    /// Placeholder rows are shown first and can never be chosen.
    pub placeholder: bool,
}

/// Presentation updates emitted by the controller and consumed by UI layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    Loading(bool),
    OptionsPopulated {
        field: Field,
        entries: Vec<SelectEntry>,
    },
    Message {
        text: String,
        kind: MessageKind,
    },
    MessageHidden,
    ButtonsEnabled(bool),
    SelectionsReset,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_mixed_option_shapes() {
        let data: InitialData = serde_json::from_str(
            r#"{"operatori":["Alice",7],"commesse":[{"value":"C1","text":"Project One"},{"value":42}],"fasi":[]}"#,
        )
        .unwrap();
        assert_eq!(
            data.operatori,
            vec![
                SelectOption::Label("Alice".into()),
                SelectOption::Label("7".into())
            ]
        );
        assert_eq!(data.commesse[0].value(), "C1");
        assert_eq!(data.commesse[0].text(), "Project One");
        assert_eq!(data.commesse[1].value(), "42");
        assert_eq!(data.commesse[1].text(), "42");
        assert!(data.fasi.is_empty());
    }

    #[test]
    fn missing_lists_decode_as_empty() {
        let data: InitialData = serde_json::from_str(r#"{"operatori":["Bob"]}"#).unwrap();
        assert_eq!(data.operatori.len(), 1);
        assert!(data.commesse.is_empty());
        assert!(data.fasi.is_empty());
    }

    #[test]
    fn rejects_null_and_valueless_options() {
        assert!(serde_json::from_str::<InitialData>(r#"{"fasi":[null]}"#).is_err());
        assert!(serde_json::from_str::<InitialData>(r#"{"fasi":[{"text":"Cut"}]}"#).is_err());
        assert!(serde_json::from_str::<InitialData>(r#"{"fasi":[true]}"#).is_err());
    }

    #[test]
    fn action_request_uses_wire_field_names() {
        let req = ActionRequest {
            action: WorkAction::EndWork,
            operator: "Alice".into(),
            commission_code: "C1".into(),
            phase: "Cut".into(),
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(
            v,
            serde_json::json!({
                "action": "endWork",
                "operatore": "Alice",
                "codiceCommessa": "C1",
                "fase": "Cut",
            })
        );
    }

    #[test]
    fn unknown_envelope_status_is_rejected() {
        let r = serde_json::from_str::<Envelope<Value>>(r#"{"status":"ok"}"#);
        assert!(r.is_err());
    }

    #[test]
    fn empty_strings_count_as_missing() {
        let sel = Selection {
            operator: Some("Alice".into()),
            commission: Some(String::new()),
            phase: None,
        };
        assert_eq!(sel.missing_fields(), vec![Field::Commission, Field::Phase]);
        assert!(sel.to_request(WorkAction::StartWork).is_none());
    }

    #[test]
    fn complete_selection_builds_request() {
        let sel = Selection {
            operator: Some("Alice".into()),
            commission: Some("C1".into()),
            phase: Some("Cut".into()),
        };
        let req = sel.to_request(WorkAction::StartWork).unwrap();
        assert_eq!(req.commission_code, "C1");
        assert_eq!(req.action.as_wire_str(), "startWork");
    }
}
