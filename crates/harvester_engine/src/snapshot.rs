use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use engine_logging::{engine_debug, engine_info};
use harvester_core::Position;
use scraper::{ElementRef, Html};

use crate::decode::{decode_snapshot, DecodeError};
use crate::{AdElement, DocumentSession, ItemNode, Locator, SessionError};

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("io error reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("no .html snapshots found in {0:?}")]
    Empty(PathBuf),
    #[error("could not decode {path:?}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },
}

/// Replays recorded renderings of a feed.
///
/// Page `k` is the document as it looked after `k` scroll-to-bottom triggers.
/// The scroll offset is the page index, so scrolling to the top shows the
/// first recording again.
pub struct SnapshotSession {
    pages: Vec<Html>,
    current: usize,
}

impl SnapshotSession {
    /// Returns `None` when `pages` is empty.
    pub fn from_pages<I, T>(pages: I) -> Option<Self>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let pages: Vec<Html> = pages
            .into_iter()
            .map(|page| Html::parse_document(page.as_ref()))
            .collect();
        if pages.is_empty() {
            return None;
        }
        Some(Self { pages, current: 0 })
    }

    /// Loads every `*.html` file in `dir`, ordered by file name.
    pub fn load_dir(dir: &Path) -> Result<Self, SnapshotError> {
        let io_err = |source| SnapshotError::Io {
            path: dir.to_path_buf(),
            source,
        };
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)
            .map_err(io_err)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|ft| ft.is_file()).unwrap_or(false))
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("html"))
            })
            .collect();
        paths.sort();

        let mut pages = Vec::with_capacity(paths.len());
        for path in &paths {
            let bytes = fs::read(path).map_err(|source| SnapshotError::Io {
                path: path.clone(),
                source,
            })?;
            let html = decode_snapshot(&bytes).map_err(|source| SnapshotError::Decode {
                path: path.clone(),
                source,
            })?;
            pages.push(html);
        }
        engine_info!("Loaded {} snapshot pages from {:?}", pages.len(), dir);
        Self::from_pages(pages).ok_or_else(|| SnapshotError::Empty(dir.to_path_buf()))
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn current_page(&self) -> usize {
        self.current
    }

    fn page(&self) -> &Html {
        &self.pages[self.current]
    }
}

impl DocumentSession for SnapshotSession {
    type Node = SnapshotNode;

    fn go_to_feed(&mut self) -> Result<(), SessionError> {
        Ok(())
    }

    fn scroll_to(&mut self, offset: u64) -> Result<(), SessionError> {
        let last = self.pages.len() - 1;
        self.current = usize::try_from(offset).map_or(last, |offset| offset.min(last));
        Ok(())
    }

    fn scroll_to_bottom(&mut self) -> Result<(), SessionError> {
        if self.current + 1 < self.pages.len() {
            self.current += 1;
            engine_debug!("Snapshot advanced to page {}", self.current);
        }
        Ok(())
    }

    fn scroll_offset(&mut self) -> Result<u64, SessionError> {
        Ok(self.current as u64)
    }

    fn has_element(&mut self, locator: &Locator) -> Result<bool, SessionError> {
        let selector = locator.selector()?;
        Ok(self.page().select(&selector).next().is_some())
    }

    fn find_item(
        &mut self,
        feed: &Locator,
        position: Position,
    ) -> Result<Option<SnapshotNode>, SessionError> {
        let selector = feed.selector()?;
        let Some(index) = position.checked_sub(1).and_then(|i| usize::try_from(i).ok()) else {
            return Ok(None);
        };
        let Some(container) = self.page().select(&selector).next() else {
            return Ok(None);
        };
        let item = container
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|child| child.value().name() == "div")
            .nth(index);
        Ok(item.map(|element| SnapshotNode {
            html: element.html(),
        }))
    }

    fn advertisement_elements(
        &mut self,
        locator: &Locator,
    ) -> Result<Vec<AdElement>, SessionError> {
        let selector = locator.selector()?;
        Ok(self
            .page()
            .select(&selector)
            .map(|element| AdElement {
                lines: element
                    .text()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(ToOwned::to_owned)
                    .collect(),
                href: element.value().attr("href").map(ToOwned::to_owned),
            })
            .collect())
    }
}

/// Detached copy of one item's markup.
#[derive(Debug, Clone)]
pub struct SnapshotNode {
    html: String,
}

impl SnapshotNode {
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }

    fn fragment(&self) -> Html {
        Html::parse_fragment(&self.html)
    }
}

impl ItemNode for SnapshotNode {
    fn text(&mut self, locator: &Locator) -> Result<Option<String>, SessionError> {
        let selector = locator.selector()?;
        let fragment = self.fragment();
        let text = fragment
            .select(&selector)
            .next()
            .map(|element| element.text().collect::<String>());
        Ok(text)
    }

    fn texts(&mut self, locator: &Locator) -> Result<Vec<String>, SessionError> {
        let selector = locator.selector()?;
        let fragment = self.fragment();
        let texts = fragment
            .select(&selector)
            .map(|element| element.text().collect::<String>())
            .collect();
        Ok(texts)
    }

    fn attr(&mut self, locator: &Locator, name: &str) -> Result<Option<String>, SessionError> {
        let selector = locator.selector()?;
        let fragment = self.fragment();
        let value = fragment
            .select(&selector)
            .next()
            .and_then(|element| element.value().attr(name))
            .map(ToOwned::to_owned);
        Ok(value)
    }

    /// Recorded markup is already fully revealed.
    fn reveal(&mut self, locator: &Locator) -> Result<(), SessionError> {
        locator.selector().map(|_| ())
    }
}
