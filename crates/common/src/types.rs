//! Core types for the wizard-flow model

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::ModelError;

/// Identifier of a page node, unique within a model
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The variant set of wizard steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Landing,
    SingleChoice,
    Date,
    Numeric,
    Text,
    /// Results page; always terminal
    Result,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Landing => write!(f, "landing"),
            NodeKind::SingleChoice => write!(f, "single-choice"),
            NodeKind::Date => write!(f, "date"),
            NodeKind::Numeric => write!(f, "numeric"),
            NodeKind::Text => write!(f, "text"),
            NodeKind::Result => write!(f, "result"),
        }
    }
}

/// Input kind of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Numeric,
    /// Day, month and year as three independent sub-fields
    Date,
    /// Radio-style single selection
    Choice,
}

/// One option of a choice field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    /// Stable value used in answers and edge predicates
    pub value: String,
    /// Visible label text used to locate the option
    pub label: String,
}

impl ChoiceOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// A named input slot group on a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<ChoiceOption>,
}

impl Field {
    pub fn text(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Text,
            options: Vec::new(),
        }
    }

    pub fn numeric(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Numeric,
            options: Vec::new(),
        }
    }

    pub fn date(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Date,
            options: Vec::new(),
        }
    }

    pub fn choice(name: impl Into<String>, options: Vec<ChoiceOption>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Choice,
            options,
        }
    }

    /// Addressable slots of this field, in fill order
    pub fn slots(&self) -> Vec<Slot> {
        match self.kind {
            FieldKind::Date => DatePart::ALL
                .iter()
                .map(|part| Slot::part(&self.name, *part))
                .collect(),
            _ => vec![Slot::whole(&self.name)],
        }
    }

    pub fn option(&self, value: &str) -> Option<&ChoiceOption> {
        self.options.iter().find(|o| o.value == value)
    }
}

/// Sub-field of a date field
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatePart {
    Day,
    Month,
    Year,
}

impl DatePart {
    pub const ALL: [DatePart; 3] = [DatePart::Day, DatePart::Month, DatePart::Year];

    pub fn as_str(&self) -> &'static str {
        match self {
            DatePart::Day => "day",
            DatePart::Month => "month",
            DatePart::Year => "year",
        }
    }

    /// Visible label of the sub-field
    pub fn label(&self) -> &'static str {
        match self {
            DatePart::Day => "Day",
            DatePart::Month => "Month",
            DatePart::Year => "Year",
        }
    }
}

/// An addressable input: a whole field or one part of a date field.
///
/// Written as `name` or `name.day`, `name.month`, `name.year`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Slot {
    pub field: String,
    pub part: Option<DatePart>,
}

impl Slot {
    pub fn whole(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            part: None,
        }
    }

    pub fn part(field: impl Into<String>, part: DatePart) -> Self {
        Self {
            field: field.into(),
            part: Some(part),
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.part {
            Some(part) => write!(f, "{}.{}", self.field, part.as_str()),
            None => f.write_str(&self.field),
        }
    }
}

impl std::str::FromStr for Slot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err("empty slot name".to_string());
        }
        match s.rsplit_once('.') {
            Some((field, part)) => {
                let part = match part {
                    "day" => DatePart::Day,
                    "month" => DatePart::Month,
                    "year" => DatePart::Year,
                    other => return Err(format!("unknown date part '{}'", other)),
                };
                Ok(Slot::part(field, part))
            }
            None => Ok(Slot::whole(s)),
        }
    }
}

impl TryFrom<String> for Slot {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Slot> for String {
    fn from(slot: Slot) -> Self {
        slot.to_string()
    }
}

/// Mapping slot -> literal value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Answers(pub BTreeMap<Slot, String>);

impl Answers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a whole-field value (text, numeric, or choice option value)
    pub fn value(mut self, field: &str, value: impl Into<String>) -> Self {
        self.0.insert(Slot::whole(field), value.into());
        self
    }

    /// Alias of [`Answers::value`] that reads better for radio answers
    pub fn choice(self, field: &str, option: &str) -> Self {
        self.value(field, option)
    }

    pub fn date(mut self, field: &str, day: &str, month: &str, year: &str) -> Self {
        self.0.insert(Slot::part(field, DatePart::Day), day.to_string());
        self.0.insert(Slot::part(field, DatePart::Month), month.to_string());
        self.0.insert(Slot::part(field, DatePart::Year), year.to_string());
        self
    }

    pub fn slot(mut self, slot: Slot, value: impl Into<String>) -> Self {
        self.0.insert(slot, value.into());
        self
    }

    pub fn get(&self, slot: &Slot) -> Option<&str> {
        self.0.get(slot).map(String::as_str)
    }

    /// Whole-field value
    pub fn field(&self, field: &str) -> Option<&str> {
        self.get(&Slot::whole(field))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Slot, &str)> {
        self.0.iter().map(|(k, v)| (k, v.as_str()))
    }

    pub fn contains(&self, slot: &Slot) -> bool {
        self.0.contains_key(slot)
    }
}

impl fmt::Display for Answers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (slot, value)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={:?}", slot, value)?;
        }
        write!(f, "}}")
    }
}

/// Semantic element roles a page exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    NavigationBar,
    Breadcrumbs,
    Heading,
    Body,
    PrimaryAction,
    ContextualSidebar,
    ContextualFooter,
    FeedbackPrompt,
    SiteFooter,
    ErrorSummary,
    ErrorHint,
}

impl Role {
    pub const ALL: [Role; 11] = [
        Role::NavigationBar,
        Role::Breadcrumbs,
        Role::Heading,
        Role::Body,
        Role::PrimaryAction,
        Role::ContextualSidebar,
        Role::ContextualFooter,
        Role::FeedbackPrompt,
        Role::SiteFooter,
        Role::ErrorSummary,
        Role::ErrorHint,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::NavigationBar => "navigation_bar",
            Role::Breadcrumbs => "breadcrumbs",
            Role::Heading => "heading",
            Role::Body => "body",
            Role::PrimaryAction => "primary_action",
            Role::ContextualSidebar => "contextual_sidebar",
            Role::ContextualFooter => "contextual_footer",
            Role::FeedbackPrompt => "feedback_prompt",
            Role::SiteFooter => "site_footer",
            Role::ErrorSummary => "error_summary",
            Role::ErrorHint => "error_hint",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| format!("unknown role '{}'", s))
    }
}

/// What an accessor call addresses on the current page
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum Target {
    Role { role: Role },
    Field { slot: Slot },
    Choice { field: String, option: String, label: String },
}

impl Target {
    pub fn role(role: Role) -> Self {
        Target::Role { role }
    }

    pub fn slot(slot: Slot) -> Self {
        Target::Field { slot }
    }

    pub fn choice(field: &str, option: &ChoiceOption) -> Self {
        Target::Choice {
            field: field.to_string(),
            option: option.value.clone(),
            label: option.label.clone(),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Role { role } => write!(f, "{}", role),
            Target::Field { slot } => write!(f, "field {}", slot),
            Target::Choice { field, option, .. } => write!(f, "choice {}={}", field, option),
        }
    }
}

/// Observed state of one element, as read through an accessor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementState {
    pub present: bool,
    pub visible: bool,
    pub enabled: bool,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub checked: Option<bool>,
}

impl ElementState {
    pub fn absent() -> Self {
        Self::default()
    }

    pub fn visible(text: impl Into<String>) -> Self {
        Self {
            present: true,
            visible: true,
            enabled: true,
            text: text.into(),
            value: None,
            checked: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_checked(mut self, checked: bool) -> Self {
        self.checked = Some(checked);
        self
    }

    /// Short human-readable rendering used as the "actual" side of a mismatch
    pub fn describe(&self) -> String {
        if !self.present {
            return "absent".to_string();
        }
        let mut parts = vec![if self.visible { "visible" } else { "hidden" }.to_string()];
        if !self.enabled {
            parts.push("disabled".to_string());
        }
        if let Some(checked) = self.checked {
            parts.push(if checked { "checked" } else { "unchecked" }.to_string());
        }
        if let Some(value) = &self.value {
            parts.push(format!("value={:?}", value));
        }
        let text = normalize_text(&self.text);
        if !text.is_empty() {
            let shown: String = text.chars().take(120).collect();
            parts.push(format!("text={:?}", shown));
        }
        parts.join(", ")
    }
}

/// Collapse runs of whitespace so rendered text compares independently of markup layout
pub fn normalize_text(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// An expectation on one element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expect {
    Visible,
    Absent,
    ContainsText { text: String },
    Enabled,
    Disabled,
    Checked,
    Unchecked,
}

impl Expect {
    pub fn contains(text: impl Into<String>) -> Self {
        Expect::ContainsText { text: text.into() }
    }

    pub fn holds(&self, state: &ElementState) -> bool {
        match self {
            Expect::Visible => state.present && state.visible,
            Expect::Absent => !state.present,
            Expect::ContainsText { text } => {
                state.present
                    && state.visible
                    && normalize_text(&state.text).contains(&normalize_text(text))
            }
            Expect::Enabled => state.present && state.enabled,
            Expect::Disabled => state.present && !state.enabled,
            Expect::Checked => state.present && state.checked == Some(true),
            Expect::Unchecked => state.present && state.checked != Some(true),
        }
    }
}

impl fmt::Display for Expect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expect::Visible => write!(f, "visible"),
            Expect::Absent => write!(f, "absent"),
            Expect::ContainsText { text } => write!(f, "visible with text {:?}", text),
            Expect::Enabled => write!(f, "enabled"),
            Expect::Disabled => write!(f, "disabled"),
            Expect::Checked => write!(f, "checked"),
            Expect::Unchecked => write!(f, "unchecked"),
        }
    }
}

/// A structural layout assertion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Check {
    pub target: Target,
    pub expect: Expect,
}

impl Check {
    pub fn new(target: Target, expect: Expect) -> Self {
        Self { target, expect }
    }

    pub fn role(role: Role, expect: Expect) -> Self {
        Self::new(Target::role(role), expect)
    }
}

/// URL substring contract of a node.
///
/// `*` stands for exactly one non-empty path segment, so
/// `/y/irregular-hours-and-part-year/*` matches `/y/irregular-hours-and-part-year/2025-11-11`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UrlPattern {
    source: String,
    regex: Regex,
}

impl UrlPattern {
    pub fn new(source: &str) -> crate::Result<Self> {
        if source.is_empty() {
            return Err(ModelError::InvalidUrlPattern {
                pattern: source.to_string(),
                reason: "pattern is empty".to_string(),
            });
        }
        let expr = source
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join("[^/?#]+");
        let regex = Regex::new(&expr).map_err(|e| ModelError::InvalidUrlPattern {
            pattern: source.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    pub fn matches(&self, url: &str) -> bool {
        self.regex.is_match(url)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Literal characters in the pattern; longer means more specific
    pub fn specificity(&self) -> usize {
        self.source.chars().filter(|c| *c != '*').count()
    }
}

impl PartialEq for UrlPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for UrlPattern {}

impl fmt::Display for UrlPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl TryFrom<String> for UrlPattern {
    type Error = ModelError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        UrlPattern::new(&s)
    }
}

impl From<UrlPattern> for String {
    fn from(p: UrlPattern) -> Self {
        p.source
    }
}

/// Expected body copy of a node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "expect", rename_all = "snake_case")]
pub enum BodyExpectation {
    Contains { text: String },
    /// The page must render no body copy at all
    Absent,
    #[default]
    Unspecified,
}

/// An input combination the page must reject
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegativeCase {
    pub name: String,
    #[serde(default)]
    pub inputs: Answers,
    pub expected_error_text: String,
    #[serde(default = "default_true")]
    pub expect_url_unchanged: bool,
}

fn default_true() -> bool {
    true
}

impl NegativeCase {
    pub fn new(name: impl Into<String>, inputs: Answers, expected_error_text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inputs,
            expected_error_text: expected_error_text.into(),
            expect_url_unchanged: true,
        }
    }
}

/// One step of the wizard and its contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageNode {
    pub id: NodeId,
    pub kind: NodeKind,
    pub url_pattern: UrlPattern,
    /// Expected heading text
    pub title: String,
    #[serde(default)]
    pub body: BodyExpectation,
    /// Text of the advance affordance ("Start now", "Continue")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_label: Option<String>,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub positive_checks: Vec<Check>,
    #[serde(default)]
    pub negative_cases: Vec<NegativeCase>,
}

impl PageNode {
    pub fn is_terminal(&self) -> bool {
        self.kind == NodeKind::Result
    }

    /// All slots of all fields, in fill order
    pub fn slots(&self) -> Vec<Slot> {
        self.fields.iter().flat_map(Field::slots).collect()
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The field whose answer selects the outgoing edge, if the node branches
    pub fn deciding_field(&self) -> Option<&Field> {
        self.fields.iter().find(|f| f.kind == FieldKind::Choice)
    }
}

/// Predicate that selects an outgoing edge
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "match", rename_all = "snake_case")]
pub enum AnswerPredicate {
    #[default]
    Any,
    Equals { field: String, value: String },
    OneOf { field: String, values: Vec<String> },
}

impl AnswerPredicate {
    pub fn equals(field: &str, value: &str) -> Self {
        AnswerPredicate::Equals {
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    pub fn matches(&self, answers: &Answers) -> bool {
        match self {
            AnswerPredicate::Any => true,
            AnswerPredicate::Equals { field, value } => answers.field(field) == Some(value.as_str()),
            AnswerPredicate::OneOf { field, values } => answers
                .field(field)
                .map(|v| values.iter().any(|candidate| candidate == v))
                .unwrap_or(false),
        }
    }
}

impl fmt::Display for AnswerPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerPredicate::Any => write!(f, "*"),
            AnswerPredicate::Equals { field, value } => write!(f, "{}={}", field, value),
            AnswerPredicate::OneOf { field, values } => write!(f, "{} in [{}]", field, values.join(", ")),
        }
    }
}

/// Where an edge leads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Destination {
    Node(NodeId),
    /// A live branch the model does not cover yet
    Unmodelled { unmodelled: String },
}

impl Destination {
    pub fn unmodelled(note: impl Into<String>) -> Self {
        Destination::Unmodelled {
            unmodelled: note.into(),
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Node(id) => write!(f, "{}", id),
            Destination::Unmodelled { unmodelled } => write!(f, "(unmodelled: {})", unmodelled),
        }
    }
}

/// Directed transition between nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub from: NodeId,
    #[serde(default)]
    pub when: AnswerPredicate,
    pub to: Destination,
}

impl Edge {
    pub fn always(from: &str, to: &str) -> Self {
        Self {
            from: NodeId::new(from),
            when: AnswerPredicate::Any,
            to: Destination::Node(NodeId::new(to)),
        }
    }

    pub fn when(from: &str, field: &str, value: &str, to: Destination) -> Self {
        Self {
            from: NodeId::new(from),
            when: AnswerPredicate::equals(field, value),
            to,
        }
    }
}

/// Outcome of resolving a transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "next", rename_all = "snake_case")]
pub enum Next {
    Node { id: NodeId },
    Terminal,
    Unmodelled { note: String },
}

impl fmt::Display for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Next::Node { id } => write!(f, "{}", id),
            Next::Terminal => write!(f, "(terminal)"),
            Next::Unmodelled { note } => write!(f, "(unmodelled: {})", note),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_parse_and_display() {
        let slot: Slot = "leave_year_start.day".parse().unwrap();
        assert_eq!(slot, Slot::part("leave_year_start", DatePart::Day));
        assert_eq!(slot.to_string(), "leave_year_start.day");

        let whole: Slot = "days_per_week".parse().unwrap();
        assert_eq!(whole.part, None);
        assert!("x.week".parse::<Slot>().is_err());
    }

    #[test]
    fn test_url_pattern_wildcard_matches_one_segment() {
        let pattern = UrlPattern::new("/y/irregular-hours-and-part-year/*").unwrap();
        assert!(pattern.matches("https://www.gov.uk/calc/y/irregular-hours-and-part-year/2025-11-11"));
        assert!(!pattern.matches("https://www.gov.uk/calc/y/irregular-hours-and-part-year"));
        assert!(!pattern.matches("https://www.gov.uk/calc/y/irregular-hours-and-part-year/"));
    }

    #[test]
    fn test_url_pattern_is_literal_otherwise() {
        let pattern = UrlPattern::new("/a.b?c").unwrap();
        assert!(pattern.matches("http://x/a.b?c=1"));
        assert!(!pattern.matches("http://x/aXb?c=1"));
    }

    #[test]
    fn test_expect_contains_text_normalizes_whitespace() {
        let state = ElementState::visible("  Please   answer\n this question ");
        assert!(Expect::contains("Please answer this question").holds(&state));
        assert!(!Expect::Absent.holds(&state));
        assert!(Expect::Absent.holds(&ElementState::absent()));
    }

    #[test]
    fn test_expect_unchecked_requires_presence() {
        let radio = ElementState::visible("Yes").with_checked(false);
        assert!(Expect::Unchecked.holds(&radio));
        assert!(!Expect::Checked.holds(&radio));
        assert!(!Expect::Unchecked.holds(&ElementState::absent()));
    }

    #[test]
    fn test_predicate_matching() {
        let answers = Answers::new().choice("irregular_hours", "yes");
        assert!(AnswerPredicate::equals("irregular_hours", "yes").matches(&answers));
        assert!(!AnswerPredicate::equals("irregular_hours", "no").matches(&answers));
        assert!(AnswerPredicate::Any.matches(&Answers::new()));
        let one_of = AnswerPredicate::OneOf {
            field: "irregular_hours".to_string(),
            values: vec!["no".to_string(), "yes".to_string()],
        };
        assert!(one_of.matches(&answers));
    }

    #[test]
    fn test_date_field_slots_are_day_month_year() {
        let field = Field::date("leave_year_start");
        let slots: Vec<String> = field.slots().iter().map(ToString::to_string).collect();
        assert_eq!(
            slots,
            vec!["leave_year_start.day", "leave_year_start.month", "leave_year_start.year"]
        );
    }

    #[test]
    fn test_answers_serialize_as_slot_map() {
        let answers = Answers::new().date("start", "11", "11", "2025");
        let json = serde_json::to_string(&answers).unwrap();
        assert_eq!(json, r#"{"start.day":"11","start.month":"11","start.year":"2025"}"#);
        let back: Answers = serde_json::from_str(&json).unwrap();
        assert_eq!(back, answers);
    }
}
