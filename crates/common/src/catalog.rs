//! Built-in model of the GOV.UK "Calculate holiday entitlement" wizard
//!
//! One canonical definition per node. Shared page chrome (navigation bar,
//! feedback prompt, footer) is declared once in [`question_chrome`] and
//! reused, so contracts cannot drift between near-identical pages.

use crate::model::WizardModel;
use crate::scenario::{NegativePolicy, Scenario};
use crate::types::{
    Answers, BodyExpectation, Check, ChoiceOption, Destination, Edge, Expect, Field, NegativeCase,
    NodeId, NodeKind, PageNode, Role, Target, UrlPattern,
};

pub const ENTRY_PATH: &str = "/calculate-your-holiday-entitlement";

pub const START: &str = "start";
pub const IRREGULAR_HOURS: &str = "irregular_hours";
pub const LEAVE_YEAR_START: &str = "leave_year_start";
pub const HOURS_IN_PAY_PERIOD: &str = "hours_in_pay_period";
pub const ENTITLEMENT_BASIS: &str = "entitlement_basis";
pub const HOLIDAY_PERIOD: &str = "holiday_period";
pub const DAYS_PER_WEEK: &str = "days_per_week";
pub const RESULT: &str = "result";

pub const ANSWER_QUESTION: &str = "Please answer this question";
pub const SEVEN_DAYS: &str = "There are only 7 days in a week. Please check and enter a correct value.";

fn pattern(suffix: &str) -> UrlPattern {
    let source = format!("{}{}", ENTRY_PATH, suffix);
    // Only fails on an empty pattern; every suffix here is prefixed by ENTRY_PATH.
    UrlPattern::new(&source).unwrap_or_else(|e| panic!("built-in URL pattern {}: {}", source, e))
}

/// Chrome every question page shares: no breadcrumbs or contextual panels
fn question_chrome() -> Vec<Check> {
    vec![
        Check::role(Role::NavigationBar, Expect::Visible),
        Check::role(Role::Breadcrumbs, Expect::Absent),
        Check::role(Role::PrimaryAction, Expect::contains("Continue")),
        Check::role(Role::ContextualSidebar, Expect::Absent),
        Check::role(Role::ContextualFooter, Expect::Absent),
        Check::role(Role::FeedbackPrompt, Expect::Visible),
        Check::role(Role::SiteFooter, Expect::Visible),
    ]
}

/// No option is preselected on arrival
fn unchecked_options(field: &Field) -> Vec<Check> {
    field
        .options
        .iter()
        .map(|option| Check::new(Target::choice(&field.name, option), Expect::Unchecked))
        .collect()
}

fn question(
    id: &str,
    kind: NodeKind,
    suffix: &str,
    title: &str,
    body: BodyExpectation,
    fields: Vec<Field>,
) -> PageNode {
    PageNode {
        id: NodeId::new(id),
        kind,
        url_pattern: pattern(suffix),
        title: title.to_string(),
        body,
        action_label: Some("Continue".to_string()),
        fields,
        positive_checks: question_chrome(),
        negative_cases: Vec::new(),
    }
}

fn start() -> PageNode {
    PageNode {
        id: NodeId::new(START),
        kind: NodeKind::Landing,
        url_pattern: pattern(""),
        title: "Calculate holiday entitlement".to_string(),
        body: BodyExpectation::Contains {
            text: "Use this tool to calculate holiday entitlement".to_string(),
        },
        action_label: Some("Start now".to_string()),
        fields: Vec::new(),
        positive_checks: vec![
            Check::role(Role::NavigationBar, Expect::Visible),
            Check::role(Role::Breadcrumbs, Expect::Visible),
            Check::role(Role::PrimaryAction, Expect::contains("Start now")),
            Check::role(Role::ContextualSidebar, Expect::contains("Related content")),
            Check::role(Role::ContextualFooter, Expect::contains("Explore the topic")),
            Check::role(Role::FeedbackPrompt, Expect::Visible),
            Check::role(Role::SiteFooter, Expect::Visible),
        ],
        negative_cases: Vec::new(),
    }
}

fn irregular_hours() -> PageNode {
    let field = Field::choice(
        IRREGULAR_HOURS,
        vec![ChoiceOption::new("yes", "Yes"), ChoiceOption::new("no", "No")],
    );
    let mut node = question(
        IRREGULAR_HOURS,
        NodeKind::SingleChoice,
        "/y",
        "Does the employee work irregular hours or for part of the year?",
        BodyExpectation::Contains {
            text: "‘Irregular hours’ means the number of hours an employee".to_string(),
        },
        vec![],
    );
    node.positive_checks.extend(unchecked_options(&field));
    node.fields.push(field);
    node.negative_cases
        .push(NegativeCase::new("no option selected", Answers::new(), ANSWER_QUESTION));
    node
}

fn leave_year_start() -> PageNode {
    let mut node = question(
        LEAVE_YEAR_START,
        NodeKind::Date,
        "/y/irregular-hours-and-part-year",
        "When does the leave year start?",
        BodyExpectation::Contains {
            text: "This is usually in the employment contract.".to_string(),
        },
        vec![Field::date(LEAVE_YEAR_START)],
    );
    node.negative_cases = vec![
        NegativeCase::new("no data entered", Answers::new(), ANSWER_QUESTION),
        NegativeCase::new(
            "invalid day with empty month and year",
            Answers::new().slot(day_slot(), "99"),
            ANSWER_QUESTION,
        ),
        NegativeCase::new(
            "day 00 with valid month and year",
            Answers::new().date(LEAVE_YEAR_START, "00", "11", "2025"),
            ANSWER_QUESTION,
        ),
        NegativeCase::new(
            "non-numeric day",
            Answers::new().date(LEAVE_YEAR_START, "!", "11", "2025"),
            ANSWER_QUESTION,
        ),
    ];
    node
}

fn day_slot() -> crate::types::Slot {
    crate::types::Slot::part(LEAVE_YEAR_START, crate::types::DatePart::Day)
}

fn hours_in_pay_period() -> PageNode {
    question(
        HOURS_IN_PAY_PERIOD,
        NodeKind::Numeric,
        "/y/irregular-hours-and-part-year/*",
        "How many hours has the employee worked in the pay period?",
        BodyExpectation::Absent,
        vec![Field::numeric(HOURS_IN_PAY_PERIOD)],
    )
}

fn entitlement_basis() -> PageNode {
    let field = Field::choice(
        ENTITLEMENT_BASIS,
        vec![
            ChoiceOption::new("days-worked-per-week", "days worked per week"),
            ChoiceOption::new("hours-worked-per-week", "hours worked per week"),
            ChoiceOption::new("annualised-hours", "annualised hours"),
            ChoiceOption::new("compressed-hours", "compressed hours"),
            ChoiceOption::new("shift-worker", "shifts"),
        ],
    );
    let mut node = question(
        ENTITLEMENT_BASIS,
        NodeKind::SingleChoice,
        "/y/regular",
        "Is the holiday entitlement based on:",
        BodyExpectation::Unspecified,
        vec![],
    );
    node.positive_checks.extend(unchecked_options(&field));
    node.fields.push(field);
    node.negative_cases
        .push(NegativeCase::new("no option selected", Answers::new(), ANSWER_QUESTION));
    node
}

fn holiday_period() -> PageNode {
    let field = Field::choice(
        HOLIDAY_PERIOD,
        vec![
            ChoiceOption::new("full-year", "for a full leave year"),
            ChoiceOption::new("starting", "for someone starting part way through a leave year"),
            ChoiceOption::new("leaving", "for someone leaving part way through a leave year"),
            ChoiceOption::new(
                "starting-and-leaving",
                "for someone starting and leaving part way through a leave year",
            ),
        ],
    );
    let mut node = question(
        HOLIDAY_PERIOD,
        NodeKind::SingleChoice,
        "/y/regular/*",
        "Do you want to work out holiday:",
        BodyExpectation::Unspecified,
        vec![],
    );
    node.positive_checks.extend(unchecked_options(&field));
    node.fields.push(field);
    node.negative_cases
        .push(NegativeCase::new("no option selected", Answers::new(), ANSWER_QUESTION));
    node
}

fn days_per_week() -> PageNode {
    let mut node = question(
        DAYS_PER_WEEK,
        NodeKind::Numeric,
        "/y/regular/days-worked-per-week",
        "Number of days worked per week?",
        BodyExpectation::Unspecified,
        vec![Field::numeric(DAYS_PER_WEEK)],
    );
    node.negative_cases = vec![
        NegativeCase::new("no value entered", Answers::new(), SEVEN_DAYS),
        NegativeCase::new(
            "text entered",
            Answers::new().value(DAYS_PER_WEEK, "textshouldnotbeallowed"),
            SEVEN_DAYS,
        ),
        NegativeCase::new(
            "special characters entered",
            Answers::new().value(DAYS_PER_WEEK, "!@£$%^&*()"),
            SEVEN_DAYS,
        ),
    ];
    node
}

fn result() -> PageNode {
    PageNode {
        id: NodeId::new(RESULT),
        kind: NodeKind::Result,
        url_pattern: pattern("/y/"),
        title: "Information based on your answers".to_string(),
        body: BodyExpectation::Contains {
            text: "The statutory".to_string(),
        },
        action_label: None,
        fields: Vec::new(),
        positive_checks: vec![
            Check::role(Role::NavigationBar, Expect::Visible),
            Check::role(Role::ContextualSidebar, Expect::Visible),
            Check::role(Role::ContextualFooter, Expect::Absent),
            Check::role(Role::ErrorSummary, Expect::Absent),
            Check::role(Role::FeedbackPrompt, Expect::Visible),
            Check::role(Role::SiteFooter, Expect::Visible),
        ],
        negative_cases: Vec::new(),
    }
}

fn edges() -> Vec<Edge> {
    let node = |id: &str| Destination::Node(NodeId::new(id));
    vec![
        Edge::always(START, IRREGULAR_HOURS),
        Edge::when(IRREGULAR_HOURS, IRREGULAR_HOURS, "yes", node(LEAVE_YEAR_START)),
        Edge::when(IRREGULAR_HOURS, IRREGULAR_HOURS, "no", node(ENTITLEMENT_BASIS)),
        Edge::always(LEAVE_YEAR_START, HOURS_IN_PAY_PERIOD),
        Edge::always(HOURS_IN_PAY_PERIOD, RESULT),
        Edge::when(ENTITLEMENT_BASIS, ENTITLEMENT_BASIS, "days-worked-per-week", node(HOLIDAY_PERIOD)),
        Edge::when(
            ENTITLEMENT_BASIS,
            ENTITLEMENT_BASIS,
            "hours-worked-per-week",
            Destination::unmodelled("entitlement based on hours worked per week"),
        ),
        Edge::when(
            ENTITLEMENT_BASIS,
            ENTITLEMENT_BASIS,
            "annualised-hours",
            Destination::unmodelled("entitlement based on annualised hours"),
        ),
        Edge::when(
            ENTITLEMENT_BASIS,
            ENTITLEMENT_BASIS,
            "compressed-hours",
            Destination::unmodelled("entitlement based on compressed hours"),
        ),
        Edge::when(
            ENTITLEMENT_BASIS,
            ENTITLEMENT_BASIS,
            "shift-worker",
            Destination::unmodelled("entitlement based on shifts"),
        ),
        Edge::when(HOLIDAY_PERIOD, HOLIDAY_PERIOD, "full-year", node(DAYS_PER_WEEK)),
        Edge::when(
            HOLIDAY_PERIOD,
            HOLIDAY_PERIOD,
            "starting",
            Destination::unmodelled("starting part way through a leave year"),
        ),
        Edge::when(
            HOLIDAY_PERIOD,
            HOLIDAY_PERIOD,
            "leaving",
            Destination::unmodelled("leaving part way through a leave year"),
        ),
        Edge::when(
            HOLIDAY_PERIOD,
            HOLIDAY_PERIOD,
            "starting-and-leaving",
            Destination::unmodelled("starting and leaving part way through a leave year"),
        ),
        Edge::always(DAYS_PER_WEEK, RESULT),
    ]
}

/// Path shared by both irregular-hours scenarios, up to the leave year question
fn irregular_prefix(scenario: Scenario) -> Scenario {
    scenario
        .step(START, Answers::new(), IRREGULAR_HOURS)
        .step(
            IRREGULAR_HOURS,
            Answers::new().choice(IRREGULAR_HOURS, "yes"),
            LEAVE_YEAR_START,
        )
}

fn regular_prefix(scenario: Scenario) -> Scenario {
    scenario
        .step(START, Answers::new(), IRREGULAR_HOURS)
        .step(
            IRREGULAR_HOURS,
            Answers::new().choice(IRREGULAR_HOURS, "no"),
            ENTITLEMENT_BASIS,
        )
        .step(
            ENTITLEMENT_BASIS,
            Answers::new().choice(ENTITLEMENT_BASIS, "days-worked-per-week"),
            HOLIDAY_PERIOD,
        )
}

fn scenarios() -> Vec<Scenario> {
    let irregular_rest = |s: Scenario| {
        s.step(
            LEAVE_YEAR_START,
            Answers::new().date(LEAVE_YEAR_START, "11", "11", "2025"),
            HOURS_IN_PAY_PERIOD,
        )
        .step(
            HOURS_IN_PAY_PERIOD,
            Answers::new().value(HOURS_IN_PAY_PERIOD, "160"),
            RESULT,
        )
    };
    let regular_rest = |s: Scenario| {
        s.step(
            HOLIDAY_PERIOD,
            Answers::new().choice(HOLIDAY_PERIOD, "full-year"),
            DAYS_PER_WEEK,
        )
        .step(DAYS_PER_WEEK, Answers::new().value(DAYS_PER_WEEK, "5"), RESULT)
    };

    vec![
        irregular_rest(irregular_prefix(
            Scenario::new("irregular-hours-pay-period")
                .describe("Irregular hours, leave year starting 11/11/2025, 160 hours in the pay period")
                .tag("smoke")
                .tag("irregular"),
        ))
        .result_text("for the pay period"),
        regular_rest(regular_prefix(
            Scenario::new("regular-days-full-year")
                .describe("Regular hours, days worked per week, full leave year, 5 days")
                .tag("smoke")
                .tag("regular"),
        )),
        irregular_rest(irregular_prefix(
            Scenario::new("leave-year-start-validation")
                .describe("Empty, out-of-range and non-numeric leave year start dates are rejected")
                .tag("validation")
                .tag("irregular")
                .negative(NegativePolicy::Nodes {
                    nodes: vec![NodeId::new(LEAVE_YEAR_START)],
                })
                .idempotent(),
        )),
        regular_rest(regular_prefix(
            Scenario::new("days-per-week-validation")
                .describe("Empty, text and special-character days per week are rejected")
                .tag("validation")
                .tag("regular")
                .negative(NegativePolicy::Nodes {
                    nodes: vec![NodeId::new(DAYS_PER_WEEK)],
                })
                .idempotent(),
        )),
        regular_rest(regular_prefix(
            Scenario::new("full-validation")
                .describe("Every negative case on the regular path")
                .tag("validation")
                .negative(NegativePolicy::AllNodes),
        )),
        Scenario::new("regular-days-starting-part-way")
            .describe("Regular hours, days worked per week, starting part way through a leave year")
            .tag("regular")
            .not_implemented("starting part way through leave year"),
        Scenario::new("regular-days-leaving-part-way")
            .describe("Regular hours, days worked per week, leaving part way through a leave year")
            .tag("regular")
            .not_implemented("leaving part way through leave year"),
    ]
}

/// The canonical holiday-entitlement model
pub fn holiday_entitlement() -> WizardModel {
    WizardModel {
        name: "calculate-holiday-entitlement".to_string(),
        entry_path: ENTRY_PATH.to_string(),
        entry: NodeId::new(START),
        nodes: vec![
            start(),
            irregular_hours(),
            leave_year_start(),
            hours_in_pay_period(),
            entitlement_basis(),
            holiday_period(),
            days_per_week(),
            result(),
        ],
        edges: edges(),
        scenarios: scenarios(),
    }
}
