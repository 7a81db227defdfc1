//! Live browser session over the Chrome DevTools Protocol.
//!
//! Every call blocks the caller on a private tokio runtime; the harvest loop
//! itself stays single-threaded.

use std::path::PathBuf;
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::Page;
use engine_logging::{engine_debug, engine_info, engine_warn};
use futures_util::StreamExt;
use harvester_core::Position;
use tokio::runtime::{Handle, Runtime};
use tokio::task::JoinHandle;

use crate::locator::locators;
use crate::{AdElement, DocumentSession, ItemNode, Locator, SessionError};

#[derive(Debug, Clone)]
pub struct ChromeSettings {
    pub home_url: String,
    /// Chrome profile directory. Reusing one keeps cookies between runs.
    pub profile_dir: Option<PathBuf>,
    pub headless: bool,
    /// Wait after navigation-like actions (login, clicking Home).
    pub settle: Duration,
}

impl Default for ChromeSettings {
    fn default() -> Self {
        Self {
            home_url: "https://www.facebook.com".to_string(),
            profile_dir: None,
            headless: true,
            settle: Duration::from_secs(3),
        }
    }
}

#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

pub struct ChromeSession {
    runtime: Runtime,
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    settle: Duration,
}

fn browser_err(err: CdpError) -> SessionError {
    SessionError::Browser(err.to_string())
}

impl ChromeSession {
    pub fn launch(settings: ChromeSettings) -> Result<Self, SessionError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|err| SessionError::Browser(format!("tokio runtime: {err}")))?;

        let mut builder = BrowserConfig::builder()
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-notifications");
        if !settings.headless {
            builder = builder.with_head();
        }
        if let Some(dir) = &settings.profile_dir {
            builder = builder.user_data_dir(dir);
        }
        let config = builder.build().map_err(SessionError::Browser)?;

        engine_info!(
            "Launching browser (headless={}, profile={:?})",
            settings.headless,
            settings.profile_dir
        );
        let (browser, page, handler) = runtime.block_on(async {
            let (browser, mut handler) = Browser::launch(config).await.map_err(browser_err)?;
            let handler = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if event.is_err() {
                        break;
                    }
                }
            });
            let page = browser
                .new_page(settings.home_url.as_str())
                .await
                .map_err(browser_err)?;
            Ok::<_, SessionError>((browser, page, handler))
        })?;

        Ok(Self {
            runtime,
            browser,
            page,
            handler,
            settle: settings.settle,
        })
    }

    /// Signs in through the login form. A page without the form is treated
    /// as an already signed-in profile.
    pub fn ensure_authenticated(&mut self, credentials: &Credentials) -> Result<(), SessionError> {
        let page = &self.page;
        let settle = self.settle;
        self.runtime.block_on(async {
            let Some(email) = first_on_page(page, &locators::LOGIN_EMAIL).await? else {
                engine_info!("No login form present; reusing signed-in session");
                return Ok(());
            };
            email.click().await.map_err(browser_err)?;
            email.type_str(&credentials.email).await.map_err(browser_err)?;

            let password = first_on_page(page, &locators::LOGIN_PASSWORD)
                .await?
                .ok_or_else(|| SessionError::Browser("login form has no password input".into()))?;
            password.click().await.map_err(browser_err)?;
            password
                .type_str(&credentials.password)
                .await
                .map_err(browser_err)?;

            let button = first_on_page(page, &locators::LOGIN_BUTTON)
                .await?
                .ok_or_else(|| SessionError::Browser("login form has no submit button".into()))?;
            button.click().await.map_err(browser_err)?;
            if let Err(err) = page.wait_for_navigation().await {
                engine_warn!("Navigation after login did not complete cleanly: {err}");
            }
            tokio::time::sleep(settle).await;
            engine_info!("Submitted login form");
            Ok(())
        })
    }

    /// Shuts the browser down and waits for its event loop to finish.
    pub fn close(self) -> Result<(), SessionError> {
        let Self {
            runtime,
            mut browser,
            handler,
            ..
        } = self;
        runtime.block_on(async {
            browser.close().await.map_err(browser_err)?;
            browser.wait().await.map_err(|err| SessionError::Browser(err.to_string()))?;
            if let Err(err) = handler.await {
                engine_warn!("Browser handler task ended abnormally: {err}");
            }
            Ok(())
        })
    }

    fn evaluate(&self, expression: &str) -> Result<serde_json::Value, SessionError> {
        let page = &self.page;
        self.runtime.block_on(async {
            let result = page
                .evaluate(expression)
                .await
                .map_err(|err| SessionError::Script(err.to_string()))?;
            Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
        })
    }

    fn node(&self, element: Element) -> ChromeNode {
        ChromeNode {
            element,
            handle: self.runtime.handle().clone(),
        }
    }
}

async fn first_on_page(page: &Page, locator: &Locator) -> Result<Option<Element>, SessionError> {
    let elements = page.find_elements(locator.as_str()).await.map_err(browser_err)?;
    Ok(elements.into_iter().next())
}

impl DocumentSession for ChromeSession {
    type Node = ChromeNode;

    /// The first screen of a fresh profile can be a welcome page; clicking
    /// Home brings up the feed.
    fn go_to_feed(&mut self) -> Result<(), SessionError> {
        let page = &self.page;
        let settle = self.settle;
        self.runtime.block_on(async {
            if let Some(home) = first_on_page(page, &locators::HOME_LINK).await? {
                home.click().await.map_err(browser_err)?;
                engine_debug!("Clicked Home");
                tokio::time::sleep(settle).await;
            }
            Ok(())
        })
    }

    fn scroll_to(&mut self, offset: u64) -> Result<(), SessionError> {
        self.evaluate(&format!("window.scrollTo(0, {offset});"))
            .map(|_| ())
    }

    fn scroll_to_bottom(&mut self) -> Result<(), SessionError> {
        self.evaluate("window.scrollTo(0, document.body.scrollHeight);")
            .map(|_| ())
    }

    fn scroll_offset(&mut self) -> Result<u64, SessionError> {
        let value = self.evaluate("window.pageYOffset")?;
        value
            .as_f64()
            .map(|offset| offset.max(0.0) as u64)
            .ok_or_else(|| SessionError::Script(format!("unexpected scroll offset {value}")))
    }

    fn has_element(&mut self, locator: &Locator) -> Result<bool, SessionError> {
        let page = &self.page;
        let found = self.runtime.block_on(first_on_page(page, locator))?;
        Ok(found.is_some())
    }

    fn find_item(
        &mut self,
        feed: &Locator,
        position: Position,
    ) -> Result<Option<ChromeNode>, SessionError> {
        let page = &self.page;
        let item = Locator::feed_item(position);
        let found = self.runtime.block_on(async {
            let Some(container) = first_on_page(page, feed).await? else {
                return Ok(None);
            };
            let items = container
                .find_elements(item.as_str())
                .await
                .map_err(browser_err)?;
            Ok::<_, SessionError>(items.into_iter().next())
        })?;
        Ok(found.map(|element| self.node(element)))
    }

    fn advertisement_elements(
        &mut self,
        locator: &Locator,
    ) -> Result<Vec<AdElement>, SessionError> {
        let page = &self.page;
        self.runtime.block_on(async {
            let elements = page
                .find_elements(locator.as_str())
                .await
                .map_err(browser_err)?;
            let mut ads = Vec::with_capacity(elements.len());
            for element in elements {
                let text = element.inner_text().await.map_err(browser_err)?;
                let href = element.attribute("href").await.map_err(browser_err)?;
                ads.push(AdElement {
                    lines: text
                        .unwrap_or_default()
                        .lines()
                        .map(ToOwned::to_owned)
                        .collect(),
                    href,
                });
            }
            Ok(ads)
        })
    }
}

/// Live element handle for one feed item.
pub struct ChromeNode {
    element: Element,
    handle: Handle,
}

impl ChromeNode {
    fn first(&self, locator: &Locator) -> Result<Option<Element>, SessionError> {
        let elements = self
            .handle
            .block_on(self.element.find_elements(locator.as_str()))
            .map_err(browser_err)?;
        Ok(elements.into_iter().next())
    }
}

impl ItemNode for ChromeNode {
    fn text(&mut self, locator: &Locator) -> Result<Option<String>, SessionError> {
        let Some(element) = self.first(locator)? else {
            return Ok(None);
        };
        self.handle
            .block_on(element.inner_text())
            .map_err(browser_err)
    }

    fn texts(&mut self, locator: &Locator) -> Result<Vec<String>, SessionError> {
        let handle = &self.handle;
        let element = &self.element;
        handle.block_on(async {
            let elements = element
                .find_elements(locator.as_str())
                .await
                .map_err(browser_err)?;
            let mut texts = Vec::with_capacity(elements.len());
            for element in elements {
                if let Some(text) = element.inner_text().await.map_err(browser_err)? {
                    texts.push(text);
                }
            }
            Ok(texts)
        })
    }

    fn attr(&mut self, locator: &Locator, name: &str) -> Result<Option<String>, SessionError> {
        let Some(element) = self.first(locator)? else {
            return Ok(None);
        };
        self.handle
            .block_on(element.attribute(name))
            .map_err(browser_err)
    }

    fn reveal(&mut self, locator: &Locator) -> Result<(), SessionError> {
        let Some(element) = self.first(locator)? else {
            return Ok(());
        };
        self.handle.block_on(async {
            element.scroll_into_view().await.map_err(browser_err)?;
            element.hover().await.map_err(browser_err)?;
            Ok(())
        })
    }
}
