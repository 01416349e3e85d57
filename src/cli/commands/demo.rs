//! Demo command: render a search box late and watch for it.

use std::time::{Duration, Instant};

use anyhow::{Result, bail};
use tokio::sync::mpsc;

use crate::config::Settings;
use crate::dom::{Document, Element, Node, ShadowRootMode};
use crate::query::{self, ShadowMode};
use crate::watcher::{self, WatchConfig};

/// Grace period on top of render delay and debounce before giving up.
const GRACE: Duration = Duration::from_secs(1);

/// Build the search box, optionally behind an open shadow root.
fn render_search_box(doc: &Document, shadow: bool) -> Result<Element> {
    let container = doc.create_element("div");
    container.set_attribute("class", "input-container");
    let input = doc.create_element("input");
    input.set_attribute("name", "q");
    input.set_attribute("value", "tokio");
    container.append_child(&input)?;

    if shadow {
        let host = doc.create_element("faceplate-search-input");
        let root = host.attach_shadow(ShadowRootMode::Open)?;
        root.append_child(&container)?;
        doc.body().append_child(&host)?;
    } else {
        doc.body().append_child(&container)?;
    }
    Ok(input)
}

pub async fn run_demo(settings: &Settings, delay_ms: u64, shadow: bool) -> Result<()> {
    let doc = Document::new();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let selector = settings.sticky.search_input_selector.as_str();
    let config = WatchConfig::builder(selector, move |element| {
        if let Err(e) = tx.send((Instant::now(), element.clone())) {
            crate::debug_event!("demo", "dropped", "report channel closed: {e}");
        }
        true
    })
    .with_settings(&settings.watch)
    .build()?;
    let debounce = config.debounce();
    let selectors = config.selectors().clone();

    let started = Instant::now();
    let cleanup = watcher::observe(&doc, config)?;

    let render_doc = doc.clone();
    let delay = Duration::from_millis(delay_ms);
    let renderer = tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        // Unrelated churn in the same turn
        for i in 0..3 {
            let noise = render_doc.create_element("span");
            noise.set_attribute("data-row", &i.to_string());
            render_doc.body().append_child(&noise)?;
        }
        render_search_box(&render_doc, shadow)
    });

    let deadline = delay + debounce + GRACE;
    let found = tokio::time::timeout(deadline, rx.recv()).await;
    cleanup.cleanup();
    let rendered = renderer.await??;

    match found {
        Ok(Some((at, element))) => {
            println!(
                "Found {element:?} after {:?} (rendered at {delay:?}, debounce {debounce:?}, \
                 shadow: {shadow})",
                at.duration_since(started)
            );
            if element != rendered {
                bail!("watcher reported a different element than the one rendered");
            }
            let mode = ShadowMode::from(settings.watch.support_shadow_dom);
            let body: Node = doc.body().into();
            let matching = query::query_all(&body, &selectors, mode);
            println!("{} element(s) now match {selectors}", matching.len());
            Ok(())
        }
        _ => {
            println!(
                "Not found within {deadline:?} (shadow: {shadow}, shadow support: {})",
                settings.watch.support_shadow_dom
            );
            Ok(())
        }
    }
}
