//! Headless Chrome accessor over the DevTools protocol
//!
//! Roles and slots resolve to CSS selectors through a [`SelectorMap`];
//! every read and action is a single `Runtime.evaluate` so the page is
//! queried as one consistent snapshot.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use wizcheck_common::{DatePart, ElementState, Role, Target};

use crate::accessor::{ElementAccessor, SessionFactory};
use crate::config::{BrowserSettings, HarnessConfig};
use crate::error::{E2eError, E2eResult};

/// Key for the text inputs of numeric and text fields
pub const INPUT_KEY: &str = "input";
/// Key for the container of one radio option; matched by label text
pub const CHOICE_ITEM_KEY: &str = "choice_item";
/// Key for the button that accepts the cookie banner; matched by text
pub const CONSENT_ACCEPT_KEY: &str = "consent_accept";
pub const CONSENT_HIDE_KEY: &str = "consent_hide";

/// Semantic role or slot kind -> CSS selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorMap {
    selectors: BTreeMap<String, String>,
}

impl SelectorMap {
    /// Selectors for GOV.UK smart answer pages
    pub fn govuk() -> Self {
        let defaults = [
            (Role::NavigationBar.as_str(), "[class*=\"super-navigation-header\"]"),
            (Role::Breadcrumbs.as_str(), "[class*=\"contextual-breadcrumbs\"]"),
            (Role::Heading.as_str(), "h1"),
            (
                Role::Body.as_str(),
                "[data-module=\"govspeak\"], .govuk-hint, .gem-c-govspeak",
            ),
            (
                Role::PrimaryAction.as_str(),
                ".govuk-button--start, .gem-c-button.govuk-button",
            ),
            (Role::ContextualSidebar.as_str(), "[class*=\"contextual-sidebar\"]"),
            (Role::ContextualFooter.as_str(), "[class*=\"contextual-footer\"]"),
            (Role::FeedbackPrompt.as_str(), "[class*=\"feedback__prompt\"]"),
            (Role::SiteFooter.as_str(), ".govuk-footer .govuk-width-container"),
            (Role::ErrorSummary.as_str(), ".govuk-error-summary"),
            (Role::ErrorHint.as_str(), ".govuk-form-group .govuk-error-message"),
            ("date_day", "input[name$=\"[day]\"]"),
            ("date_month", "input[name$=\"[month]\"]"),
            ("date_year", "input[name$=\"[year]\"]"),
            (INPUT_KEY, "input.govuk-input"),
            (CHOICE_ITEM_KEY, ".govuk-radios__item"),
            (CONSENT_ACCEPT_KEY, "Accept additional cookies"),
            (CONSENT_HIDE_KEY, "[data-hide-cookie-banner=\"true\"]"),
        ];
        Self {
            selectors: defaults
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    pub fn with_overrides(mut self, overrides: &BTreeMap<String, String>) -> Self {
        for (key, selector) in overrides {
            self.selectors.insert(key.clone(), selector.clone());
        }
        self
    }

    pub fn get(&self, key: &str) -> E2eResult<&str> {
        self.selectors
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| E2eError::InvalidConfig(format!("no selector for {}", key)))
    }

    /// Selector and optional label filter for a target
    fn resolve<'t>(&self, target: &'t Target) -> E2eResult<(&str, Option<&'t str>)> {
        match target {
            Target::Role { role } => Ok((self.get(role.as_str())?, None)),
            Target::Field { slot } => {
                let key = match slot.part {
                    Some(DatePart::Day) => "date_day",
                    Some(DatePart::Month) => "date_month",
                    Some(DatePart::Year) => "date_year",
                    None => INPUT_KEY,
                };
                Ok((self.get(key)?, None))
            }
            Target::Choice { label, .. } => Ok((self.get(CHOICE_ITEM_KEY)?, Some(label.as_str()))),
        }
    }
}

impl Default for SelectorMap {
    fn default() -> Self {
        Self::govuk()
    }
}

/// Shared prelude: `locate()` returns `[item, input]` for the first visible match
const LOCATE_JS: &str = r#"
const norm = s => (s || '').replace(/\s+/g, ' ').trim();
const shown = el => !!(el.offsetWidth || el.offsetHeight || el.getClientRects().length)
    && getComputedStyle(el).visibility !== 'hidden';
const locate = () => {
    let items = Array.from(document.querySelectorAll(SELECTOR));
    if (LABEL !== null) {
        items = items.filter(item => norm(item.innerText || item.textContent) === norm(LABEL));
    }
    if (items.length === 0) return null;
    const item = items.find(shown) || items[0];
    const input = LABEL !== null ? (item.querySelector('input') || item) : item;
    return [item, input];
};
"#;

/// Wrap `body` with its inputs bound as JSON literals
fn script(selector: &str, label: Option<&str>, text: Option<&str>, body: &str) -> E2eResult<String> {
    Ok(format!(
        "(() => {{ const SELECTOR = {}; const LABEL = {}; const TEXT = {}; {} {} }})()",
        serde_json::to_string(selector)?,
        serde_json::to_string(&label)?,
        serde_json::to_string(&text)?,
        LOCATE_JS,
        body
    ))
}

const PROBE_BODY: &str = r#"
const found = locate();
if (!found) return { present: false, visible: false, enabled: false, text: '', value: null, checked: null };
const [item, input] = found;
const textual = input.tagName === 'INPUT' || input.tagName === 'TEXTAREA' || input.tagName === 'SELECT';
const choice = input.type === 'radio' || input.type === 'checkbox';
return {
    present: true,
    visible: shown(item),
    enabled: !input.disabled,
    text: norm(item.innerText || item.textContent),
    value: textual && !choice ? String(input.value) : null,
    checked: choice ? !!input.checked : null,
};
"#;

const TYPE_BODY: &str = r#"
const found = locate();
if (!found) return false;
const input = found[1];
input.focus();
input.value = input.value + TEXT;
input.dispatchEvent(new Event('input', { bubbles: true }));
input.dispatchEvent(new Event('change', { bubbles: true }));
return true;
"#;

const CLEAR_BODY: &str = r#"
const found = locate();
if (!found) return false;
const input = found[1];
input.value = '';
input.dispatchEvent(new Event('input', { bubbles: true }));
input.dispatchEvent(new Event('change', { bubbles: true }));
return true;
"#;

const CLICK_BODY: &str = r#"
const found = locate();
if (!found) return false;
found[1].click();
return true;
"#;

const CONSENT_BODY: &str = r#"
const accept = Array.from(document.querySelectorAll('button'))
    .find(b => norm(b.innerText || b.textContent) === norm(LABEL));
if (!accept) return false;
accept.click();
const hide = document.querySelector(SELECTOR);
if (hide) hide.click();
return true;
"#;

/// One Chrome process with a single page
pub struct ChromiumSession {
    browser: Mutex<Option<Browser>>,
    page: Page,
    handler: JoinHandle<()>,
    selectors: SelectorMap,
}

impl ChromiumSession {
    pub async fn launch(settings: &BrowserSettings, selectors: SelectorMap) -> E2eResult<Self> {
        let mut builder =
            BrowserConfig::builder().window_size(settings.viewport_width, settings.viewport_height);
        if !settings.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &settings.chrome_executable {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(E2eError::Browser)?;

        let (browser, mut events) = Browser::launch(config).await?;
        let handler = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "DevTools connection closed");
                    break;
                }
            }
        });

        let page = browser.new_page("about:blank").await?;
        info!(headless = settings.headless, "Launched Chrome session");

        Ok(Self {
            browser: Mutex::new(Some(browser)),
            page,
            handler,
            selectors,
        })
    }

    async fn eval<T: DeserializeOwned>(&self, js: &str) -> E2eResult<T> {
        self.page
            .evaluate(js)
            .await?
            .into_value::<T>()
            .map_err(|e| E2eError::Browser(format!("unexpected script result: {}", e)))
    }

    async fn act(&self, target: &Target, text: Option<&str>, body: &str) -> E2eResult<()> {
        let (selector, label) = self.selectors.resolve(target)?;
        let found: bool = self.eval(&script(selector, label, text, body)?).await?;
        if found {
            Ok(())
        } else {
            Err(E2eError::ElementNotFound(target.to_string()))
        }
    }
}

#[async_trait]
impl ElementAccessor for ChromiumSession {
    async fn navigate(&self, url: &str) -> E2eResult<()> {
        debug!(url, "Navigate");
        self.page.goto(url).await?;
        Ok(())
    }

    async fn current_url(&self) -> E2eResult<String> {
        Ok(self
            .page
            .url()
            .await?
            .unwrap_or_else(|| "about:blank".to_string()))
    }

    async fn bootstrap(&self) -> E2eResult<()> {
        let accept = self.selectors.get(CONSENT_ACCEPT_KEY)?;
        let hide = self.selectors.get(CONSENT_HIDE_KEY)?;
        let accepted: bool = self.eval(&script(hide, Some(accept), None, CONSENT_BODY)?).await?;
        debug!(accepted, "Consent banner");
        Ok(())
    }

    async fn probe(&self, target: &Target) -> E2eResult<ElementState> {
        let (selector, label) = self.selectors.resolve(target)?;
        self.eval(&script(selector, label, None, PROBE_BODY)?).await
    }

    async fn type_text(&self, target: &Target, text: &str) -> E2eResult<()> {
        self.act(target, Some(text), TYPE_BODY).await
    }

    async fn clear(&self, target: &Target) -> E2eResult<()> {
        self.act(target, None, CLEAR_BODY).await
    }

    async fn click(&self, target: &Target) -> E2eResult<()> {
        self.act(target, None, CLICK_BODY).await
    }

    async fn close(&self) -> E2eResult<()> {
        if let Some(mut browser) = self.browser.lock().await.take() {
            browser.close().await?;
        }
        self.handler.abort();
        Ok(())
    }
}

/// Launches one Chrome per session
pub struct ChromiumFactory {
    settings: BrowserSettings,
    selectors: SelectorMap,
}

impl ChromiumFactory {
    pub fn new(settings: BrowserSettings, selectors: SelectorMap) -> Self {
        Self { settings, selectors }
    }

    pub fn from_config(config: &HarnessConfig) -> Self {
        Self::new(
            config.browser.clone(),
            SelectorMap::govuk().with_overrides(&config.selectors),
        )
    }
}

#[async_trait]
impl SessionFactory for ChromiumFactory {
    async fn open(&self) -> E2eResult<Box<dyn ElementAccessor>> {
        let session = ChromiumSession::launch(&self.settings, self.selectors.clone()).await?;
        Ok(Box::new(session))
    }

    fn describe(&self) -> String {
        if self.settings.headless {
            "headless chrome".to_string()
        } else {
            "chrome".to_string()
        }
    }
}
