//! In-memory rendition of the holiday entitlement wizard
//!
//! Behaves like the live service as far as the harness can observe it:
//! a consent banner that blocks the primary action until accepted,
//! answer-encoded URLs, GOV.UK-style error summary plus inline hint, and
//! inputs that keep their values across a failed submission. Faults can be
//! injected to make the site break specific contracts.

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use wizcheck_common::{normalize_text, DatePart, ElementState, Role, Target};

use crate::accessor::{ElementAccessor, SessionFactory};
use crate::error::{E2eError, E2eResult};

const ENTRY_PATH: &str = "/calculate-your-holiday-entitlement";
const ANSWER_QUESTION: &str = "Please answer this question";
const SEVEN_DAYS: &str = "There are only 7 days in a week. Please check and enter a correct value.";

/// Pages of the simulated wizard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageKey {
    Start,
    IrregularHours,
    LeaveYearStart,
    HoursInPayPeriod,
    EntitlementBasis,
    HolidayPeriod,
    DaysPerWeek,
    Result,
    /// A branch that exists on the service but is not simulated in detail
    Unbuilt,
    NotFound,
}

impl PageKey {
    fn heading(&self) -> &'static str {
        match self {
            PageKey::Start => "Calculate holiday entitlement",
            PageKey::IrregularHours => "Does the employee work irregular hours or for part of the year?",
            PageKey::LeaveYearStart => "When does the leave year start?",
            PageKey::HoursInPayPeriod => "How many hours has the employee worked in the pay period?",
            PageKey::EntitlementBasis => "Is the holiday entitlement based on:",
            PageKey::HolidayPeriod => "Do you want to work out holiday:",
            PageKey::DaysPerWeek => "Number of days worked per week?",
            PageKey::Result => "Information based on your answers",
            PageKey::Unbuilt => "What was the employment start date?",
            PageKey::NotFound => "Page not found",
        }
    }

    fn hint(&self) -> Option<&'static str> {
        match self {
            PageKey::Start => Some(
                "Use this tool to calculate holiday entitlement for an employee working a \
                 regular or irregular pattern of hours.",
            ),
            PageKey::IrregularHours => Some(
                "‘Irregular hours’ means the number of hours an employee works each pay period \
                 varies wholly or mostly.",
            ),
            PageKey::LeaveYearStart => Some("This is usually in the employment contract."),
            _ => None,
        }
    }

    /// `(value, label)` of each radio
    fn options(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            PageKey::IrregularHours => &[("yes", "Yes"), ("no", "No")],
            PageKey::EntitlementBasis => &[
                ("days-worked-per-week", "days worked per week"),
                ("hours-worked-per-week", "hours worked per week"),
                ("annualised-hours", "annualised hours"),
                ("compressed-hours", "compressed hours"),
                ("shift-worker", "shifts"),
            ],
            PageKey::HolidayPeriod => &[
                ("full-year", "for a full leave year"),
                ("starting", "for someone starting part way through a leave year"),
                ("leaving", "for someone leaving part way through a leave year"),
                (
                    "starting-and-leaving",
                    "for someone starting and leaving part way through a leave year",
                ),
            ],
            _ => &[],
        }
    }

    fn inputs(&self) -> &'static [&'static str] {
        match self {
            PageKey::LeaveYearStart | PageKey::Unbuilt => &["day", "month", "year"],
            PageKey::HoursInPayPeriod | PageKey::DaysPerWeek => &["value"],
            _ => &[],
        }
    }

    fn is_question(&self) -> bool {
        !matches!(self, PageKey::Start | PageKey::Result | PageKey::NotFound)
    }

    /// Path used when a fault sends the user here without the answers that lead to it
    fn detached_path(&self) -> String {
        let suffix = match self {
            PageKey::Start => "",
            PageKey::IrregularHours => "/y",
            PageKey::LeaveYearStart => "/y/irregular-hours-and-part-year",
            PageKey::HoursInPayPeriod => "/y/irregular-hours-and-part-year/2025-01-01",
            PageKey::EntitlementBasis => "/y/regular",
            PageKey::HolidayPeriod => "/y/regular/days-worked-per-week",
            PageKey::DaysPerWeek => "/y/regular/days-worked-per-week/full-year",
            PageKey::Result => "/y/regular/days-worked-per-week/full-year/5.0",
            PageKey::Unbuilt => "/y/regular/days-worked-per-week/starting",
            PageKey::NotFound => "/not-found",
        };
        format!("{}{}", ENTRY_PATH, suffix)
    }
}

/// A contract the simulated site should break
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "fault", rename_all = "snake_case")]
pub enum Fault {
    /// Render `heading` instead of the page's own
    WrongHeading { page: PageKey, heading: String },
    /// A valid submission on `from` lands on `to`
    WrongRedirect { from: PageKey, to: PageKey },
    /// Errors on `page` show the summary but no inline hint
    MissingErrorHint { page: PageKey },
    /// Clearing an input leaves its value in place
    StickyFields,
    /// Invalid input on `page` is accepted and the wizard moves on
    AcceptsInvalidInput { page: PageKey },
    /// Hide one element of `page`
    HiddenElement { page: PageKey, role: Role },
    /// Errors on `page` show `hint` inline instead of the summary's message
    DivergentHint { page: PageKey, hint: String },
    /// Every element read on `page` hangs
    StalledPage { page: PageKey },
    /// Reads of the error summary and hint on `page` hang once an error is shown
    StalledErrors { page: PageKey },
}

#[derive(Debug, Clone)]
struct SiteState {
    page: Option<PageKey>,
    path: String,
    consent_pending: bool,
    inputs: BTreeMap<&'static str, String>,
    selected: Option<&'static str>,
    error: Option<&'static str>,
    result_body: String,
}

impl Default for SiteState {
    fn default() -> Self {
        Self {
            page: None,
            path: String::new(),
            consent_pending: true,
            inputs: BTreeMap::new(),
            selected: None,
            error: None,
            result_body: String::new(),
        }
    }
}

impl SiteState {
    fn show(&mut self, page: PageKey, path: String) {
        debug!(?page, %path, "Simulated page");
        self.page = Some(page);
        self.path = path;
        self.inputs = page.inputs().iter().map(|name| (*name, String::new())).collect();
        self.selected = None;
        self.error = None;
    }

    fn input(&self, name: &str) -> &str {
        self.inputs.get(name).map(String::as_str).unwrap_or("")
    }
}

/// One simulated browser session
pub struct SimulatedSite {
    base_url: String,
    faults: Vec<Fault>,
    state: Mutex<SiteState>,
}

impl SimulatedSite {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_faults(base_url, Vec::new())
    }

    pub fn with_faults(base_url: impl Into<String>, faults: Vec<Fault>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            faults,
            state: Mutex::new(SiteState::default()),
        }
    }

    /// Page currently shown, if any
    pub fn page(&self) -> Option<PageKey> {
        self.state.lock().page
    }

    pub fn consent_pending(&self) -> bool {
        self.state.lock().consent_pending
    }

    fn has_fault(&self, check: impl Fn(&Fault) -> bool) -> bool {
        self.faults.iter().any(check)
    }

    fn heading(&self, page: PageKey) -> String {
        self.faults
            .iter()
            .find_map(|f| match f {
                Fault::WrongHeading { page: p, heading } if *p == page => Some(heading.clone()),
                _ => None,
            })
            .unwrap_or_else(|| page.heading().to_string())
    }

    fn role_state(&self, state: &SiteState, page: PageKey, role: Role) -> ElementState {
        if self.has_fault(|f| matches!(f, Fault::HiddenElement { page: p, role: r } if *p == page && *r == role)) {
            return ElementState::absent();
        }

        let question = page.is_question();
        match role {
            Role::NavigationBar => ElementState::visible("Menu Search GOV.UK"),
            Role::Breadcrumbs if page == PageKey::Start => {
                ElementState::visible("Home Employing people Holiday entitlement")
            }
            Role::Breadcrumbs => ElementState::absent(),
            Role::Heading => ElementState::visible(self.heading(page)),
            Role::Body => match page {
                PageKey::Result => ElementState::visible(state.result_body.clone()),
                _ => page.hint().map(ElementState::visible).unwrap_or_default(),
            },
            Role::PrimaryAction => match page {
                PageKey::Start => ElementState::visible("Start now"),
                _ if question => ElementState::visible("Continue"),
                _ => ElementState::absent(),
            },
            Role::ContextualSidebar => match page {
                PageKey::Start | PageKey::Result => {
                    ElementState::visible("Related content Holiday entitlement Holiday pay")
                }
                _ => ElementState::absent(),
            },
            Role::ContextualFooter if page == PageKey::Start => {
                ElementState::visible("Explore the topic Employing people")
            }
            Role::ContextualFooter => ElementState::absent(),
            Role::FeedbackPrompt => ElementState::visible("Is this page useful? Yes No"),
            Role::SiteFooter => ElementState::visible("All content is available under the Open Government Licence"),
            Role::ErrorSummary => match state.error {
                Some(message) => ElementState::visible(format!("There is a problem {}", message)),
                None => ElementState::absent(),
            },
            Role::ErrorHint => match state.error {
                Some(_) if self.has_fault(|f| matches!(f, Fault::MissingErrorHint { page: p } if *p == page)) => {
                    ElementState::absent()
                }
                Some(message) => ElementState::visible(
                    self.faults
                        .iter()
                        .find_map(|f| match f {
                            Fault::DivergentHint { page: p, hint } if *p == page => Some(hint.clone()),
                            _ => None,
                        })
                        .unwrap_or_else(|| format!("Error: {}", message)),
                ),
                None => ElementState::absent(),
            },
        }
    }

    fn stalls(&self, state: &SiteState, target: &Target) -> bool {
        let Some(page) = state.page else {
            return false;
        };
        let error_role = matches!(
            target,
            Target::Role {
                role: Role::ErrorSummary | Role::ErrorHint
            }
        );
        self.has_fault(|f| match f {
            Fault::StalledPage { page: p } => *p == page,
            Fault::StalledErrors { page: p } => *p == page && error_role && state.error.is_some(),
            _ => false,
        })
    }

    fn input_name(target: &Target) -> Option<&'static str> {
        match target {
            Target::Field { slot } => Some(match slot.part {
                Some(DatePart::Day) => "day",
                Some(DatePart::Month) => "month",
                Some(DatePart::Year) => "year",
                None => "value",
            }),
            _ => None,
        }
    }

    fn option_for(page: PageKey, label: &str) -> Option<(&'static str, &'static str)> {
        let wanted = normalize_text(label);
        page.options()
            .iter()
            .copied()
            .find(|(_, l)| normalize_text(l) == wanted)
    }

    fn read(&self, state: &SiteState, target: &Target) -> ElementState {
        let page = match state.page {
            Some(page) => page,
            None => return ElementState::absent(),
        };

        match target {
            Target::Role { role } => self.role_state(state, page, *role),
            Target::Field { .. } => match Self::input_name(target) {
                Some(name) if state.inputs.contains_key(name) => {
                    ElementState::visible("").with_value(state.input(name))
                }
                _ => ElementState::absent(),
            },
            Target::Choice { label, .. } => match Self::option_for(page, label) {
                Some((value, label)) => {
                    ElementState::visible(label).with_checked(state.selected == Some(value))
                }
                None => ElementState::absent(),
            },
        }
    }

    /// Apply the current page's validation and move on, or show the error
    fn submit(&self, state: &mut SiteState, page: PageKey) {
        let outcome = self.evaluate(state, page);
        let accepts_invalid =
            self.has_fault(|f| matches!(f, Fault::AcceptsInvalidInput { page: p } if *p == page));

        match outcome {
            Err(message) if !accepts_invalid => {
                debug!(?page, message, "Simulated validation error");
                state.error = Some(message);
            }
            Err(_) => {
                let (next, path) = self.fallback_next(state, page);
                self.land(state, page, next, path);
            }
            Ok((next, path)) => self.land(state, page, next, path),
        }
    }

    fn land(&self, state: &mut SiteState, from: PageKey, next: PageKey, path: String) {
        let redirect = self.faults.iter().find_map(|f| match f {
            Fault::WrongRedirect { from: p, to } if *p == from => Some(*to),
            _ => None,
        });
        match redirect {
            Some(to) => state.show(to, to.detached_path()),
            None => state.show(next, path),
        }
    }

    fn evaluate(&self, state: &mut SiteState, page: PageKey) -> Result<(PageKey, String), &'static str> {
        let here = state.path.clone();
        match page {
            PageKey::Start => Ok((PageKey::IrregularHours, format!("{}/y", here))),
            PageKey::IrregularHours => match state.selected {
                Some("yes") => Ok((
                    PageKey::LeaveYearStart,
                    format!("{}/irregular-hours-and-part-year", here),
                )),
                Some(_) => Ok((PageKey::EntitlementBasis, format!("{}/regular", here))),
                None => Err(ANSWER_QUESTION),
            },
            PageKey::LeaveYearStart => {
                let date = parse_date(state.input("day"), state.input("month"), state.input("year"))
                    .ok_or(ANSWER_QUESTION)?;
                let date = date.format("%Y-%m-%d").to_string();
                Ok((PageKey::HoursInPayPeriod, format!("{}/{}", here, date)))
            }
            PageKey::HoursInPayPeriod => {
                let hours = parse_positive(state.input("value")).ok_or(ANSWER_QUESTION)?;
                state.result_body = format!(
                    "The statutory holiday entitlement is {:.2} hours holiday for the pay period.",
                    hours * 0.1207
                );
                Ok((PageKey::Result, format!("{}/{:.1}", here, hours)))
            }
            PageKey::EntitlementBasis => match state.selected {
                Some(selected) => Ok((PageKey::HolidayPeriod, format!("{}/{}", here, selected))),
                None => Err(ANSWER_QUESTION),
            },
            PageKey::HolidayPeriod => match state.selected {
                Some("full-year") => Ok((PageKey::DaysPerWeek, format!("{}/full-year", here))),
                Some(selected) => Ok((PageKey::Unbuilt, format!("{}/{}", here, selected))),
                None => Err(ANSWER_QUESTION),
            },
            PageKey::DaysPerWeek => {
                let days = parse_positive(state.input("value"))
                    .filter(|d| *d <= 7.0)
                    .ok_or(SEVEN_DAYS)?;
                state.result_body = format!(
                    "The statutory holiday entitlement is {} days holiday.",
                    format_days((days * 5.6).min(28.0))
                );
                Ok((PageKey::Result, format!("{}/{:.1}", here, days)))
            }
            PageKey::Unbuilt => Err(ANSWER_QUESTION),
            PageKey::Result | PageKey::NotFound => Ok((page, here)),
        }
    }

    /// Where an accepted invalid answer leads
    fn fallback_next(&self, state: &mut SiteState, page: PageKey) -> (PageKey, String) {
        let here = state.path.clone();
        let next = match page {
            PageKey::IrregularHours => PageKey::LeaveYearStart,
            PageKey::LeaveYearStart => PageKey::HoursInPayPeriod,
            PageKey::EntitlementBasis => PageKey::HolidayPeriod,
            PageKey::HolidayPeriod => PageKey::DaysPerWeek,
            PageKey::HoursInPayPeriod | PageKey::DaysPerWeek => PageKey::Result,
            other => other,
        };
        state.result_body = "The statutory holiday entitlement is 0 days holiday.".to_string();
        (next, format!("{}/invalid", here))
    }
}

fn parse_date(day: &str, month: &str, year: &str) -> Option<NaiveDate> {
    let part = |s: &str| -> Option<u32> {
        let s = s.trim();
        if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        s.parse().ok()
    };
    let year = part(year)?;
    if !(1000..=9999).contains(&year) {
        return None;
    }
    NaiveDate::from_ymd_opt(year as i32, part(month)?, part(day)?)
}

fn parse_positive(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
}

fn format_days(days: f64) -> String {
    let days = (days * 10.0).round() / 10.0;
    if days.fract() == 0.0 {
        format!("{}", days as u64)
    } else {
        format!("{:.1}", days)
    }
}

#[async_trait]
impl ElementAccessor for SimulatedSite {
    async fn navigate(&self, url: &str) -> E2eResult<()> {
        let path = url.strip_prefix(&self.base_url).ok_or_else(|| {
            E2eError::Browser(format!("{} is outside the simulated site {}", url, self.base_url))
        })?;
        let path = path.trim_end_matches('/');
        let mut state = self.state.lock();
        if path == ENTRY_PATH {
            state.show(PageKey::Start, path.to_string());
        } else {
            state.show(PageKey::NotFound, path.to_string());
        }
        Ok(())
    }

    async fn current_url(&self) -> E2eResult<String> {
        let state = self.state.lock();
        if state.page.is_none() {
            return Ok("about:blank".to_string());
        }
        Ok(format!("{}{}", self.base_url, state.path))
    }

    async fn bootstrap(&self) -> E2eResult<()> {
        let mut state = self.state.lock();
        if state.consent_pending {
            debug!("Accepting simulated cookie banner");
            state.consent_pending = false;
        }
        Ok(())
    }

    async fn probe(&self, target: &Target) -> E2eResult<ElementState> {
        let read = {
            let state = self.state.lock();
            if self.stalls(&state, target) {
                None
            } else {
                Some(self.read(&state, target))
            }
        };
        match read {
            Some(element) => Ok(element),
            None => {
                debug!(%target, "Simulated read stalled");
                futures::future::pending().await
            }
        }
    }

    async fn type_text(&self, target: &Target, text: &str) -> E2eResult<()> {
        let mut state = self.state.lock();
        let name = Self::input_name(target)
            .filter(|name| state.inputs.contains_key(name))
            .ok_or_else(|| E2eError::ElementNotFound(target.to_string()))?;
        if let Some(value) = state.inputs.get_mut(name) {
            value.push_str(text);
        }
        Ok(())
    }

    async fn clear(&self, target: &Target) -> E2eResult<()> {
        let mut state = self.state.lock();
        let name = Self::input_name(target)
            .filter(|name| state.inputs.contains_key(name))
            .ok_or_else(|| E2eError::ElementNotFound(target.to_string()))?;
        if self.has_fault(|f| matches!(f, Fault::StickyFields)) {
            return Ok(());
        }
        if let Some(value) = state.inputs.get_mut(name) {
            value.clear();
        }
        Ok(())
    }

    async fn click(&self, target: &Target) -> E2eResult<()> {
        let mut state = self.state.lock();
        let page = state
            .page
            .ok_or_else(|| E2eError::ElementNotFound(target.to_string()))?;

        match target {
            Target::Role {
                role: Role::PrimaryAction,
            } => {
                if !self.read(&state, target).visible {
                    return Err(E2eError::ElementNotFound(target.to_string()));
                }
                if state.consent_pending {
                    return Err(E2eError::NotInteractable {
                        target: target.to_string(),
                        reason: "obscured by the cookie banner".to_string(),
                    });
                }
                self.submit(&mut state, page);
                Ok(())
            }
            Target::Choice { label, .. } => {
                let (value, _) = Self::option_for(page, label)
                    .ok_or_else(|| E2eError::ElementNotFound(target.to_string()))?;
                state.selected = Some(value);
                Ok(())
            }
            _ => Err(E2eError::NotInteractable {
                target: target.to_string(),
                reason: "not clickable".to_string(),
            }),
        }
    }
}

/// Opens independent simulated sessions sharing one fault list
#[derive(Debug, Clone)]
pub struct SimulatedFactory {
    base_url: String,
    faults: Vec<Fault>,
}

impl SimulatedFactory {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            faults: Vec::new(),
        }
    }

    pub fn with_fault(mut self, fault: Fault) -> Self {
        self.faults.push(fault);
        self
    }
}

#[async_trait]
impl SessionFactory for SimulatedFactory {
    async fn open(&self) -> E2eResult<Box<dyn ElementAccessor>> {
        Ok(Box::new(SimulatedSite::with_faults(
            self.base_url.clone(),
            self.faults.clone(),
        )))
    }

    fn describe(&self) -> String {
        format!("simulated {}", self.base_url)
    }
}
