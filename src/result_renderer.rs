pub mod formatting;

use crate::backend::{self, QueryBackend};
use crate::query_response::{MatchRecord, QueryResponse};
use crate::render_surface::{Element, ElementId, RenderSurface, Tag};
use crate::result_renderer::formatting::{
    format_endpoint, Direction, Verdict, ERROR_CLASS, HOSTNAME_CLASS, PORT_CLASS,
};
use std::cell::RefCell;
use std::rc::Rc;
use tokio::task::JoinHandle;

/// Address cell waiting for its hostname
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentSlot {
    pub address: String,
    pub cell: ElementId,
}

/// Outcome of one render pass
#[derive(Debug)]
pub struct RenderPass {
    pub tables: usize,
    /// One task per reverse DNS lookup, in issue order
    pub enrichments: Vec<JoinHandle<()>>,
}

impl RenderPass {
    /// Waits until every lookup of this pass has delivered or failed
    pub async fn settle(self) {
        for enrichment in self.enrichments {
            let _ = enrichment.await;
        }
    }
}

pub struct ResultRenderer {
    surface: Rc<RefCell<RenderSurface>>,
    backend: Rc<dyn QueryBackend>,
}

impl ResultRenderer {
    pub fn new(surface: Rc<RefCell<RenderSurface>>, backend: Rc<dyn QueryBackend>) -> Self {
        Self { surface, backend }
    }

    pub fn surface(&self) -> &Rc<RefCell<RenderSurface>> {
        &self.surface
    }

    /// Replaces the surface content with `response` and starts hostname lookups.
    ///
    /// Must be called from within a `tokio::task::LocalSet`. The returned pass does not need
    /// to be awaited; lookups deliver into their cells whenever they complete.
    pub fn render(&self, response: &QueryResponse) -> RenderPass {
        let slots = build(&mut self.surface.borrow_mut(), response);
        let tables = self.surface.borrow().count_roots(Tag::Table, None);

        let enrichments = slots
            .into_iter()
            .map(|slot| self.spawn_enrichment(slot))
            .collect();

        RenderPass {
            tables,
            enrichments,
        }
    }

    fn spawn_enrichment(&self, slot: EnrichmentSlot) -> JoinHandle<()> {
        let surface = self.surface.clone();
        let backend = self.backend.clone();
        tokio::task::spawn_local(async move { enrich(&*backend, &surface, slot).await })
    }
}

/// Clears `surface` and renders `response` into it.
///
/// Returns the source and destination slot of each rendered record, in record order.
pub fn build(surface: &mut RenderSurface, response: &QueryResponse) -> Vec<EnrichmentSlot> {
    surface.clear();

    match response {
        QueryResponse::Error(message) => {
            surface.append_root(
                Element::new(Tag::Pre)
                    .with_class(ERROR_CLASS)
                    .with_text(message.as_str()),
            );
            Vec::new()
        }
        QueryResponse::Matches(records) => {
            let mut slots = Vec::with_capacity(records.len() * 2);
            for record in records {
                match build_record(surface, record) {
                    Some(record_slots) => slots.extend(record_slots),
                    None => log::debug!(
                        "Skipping hostname lookups for {} -> {}: table was detached",
                        record.source_address,
                        record.destination_address
                    ),
                }
            }
            slots
        }
    }
}

fn build_record(surface: &mut RenderSurface, record: &MatchRecord) -> Option<[EnrichmentSlot; 2]> {
    let direction = Direction::of_policy_file(&record.policy_file);
    let verdict = Verdict::of_result(&record.result);

    let table = surface.append_root(Element::new(Tag::Table));
    surface.append_child(
        table,
        Element::new(Tag::Caption).with_text(record.protocol.to_uppercase()),
    )?;
    let row = surface.append_child(table, Element::new(Tag::Row))?;

    let arrow = Element::new(Tag::Cell)
        .with_class(verdict.class())
        .with_text(direction.arrow());
    let source = endpoint_cell(&record.protocol, &record.source_address, &record.source_port);
    let destination = endpoint_cell(
        &record.protocol,
        &record.destination_address,
        &record.destination_port,
    );

    let (source, destination) = match direction {
        Direction::Outbound => {
            let destination = append_endpoint(surface, row, destination)?;
            surface.append_child(row, arrow)?;
            let source = append_endpoint(surface, row, source)?;
            (source, destination)
        }
        Direction::Inbound => {
            let source = append_endpoint(surface, row, source)?;
            surface.append_child(row, arrow)?;
            let destination = append_endpoint(surface, row, destination)?;
            (source, destination)
        }
    };

    surface.append_root(Element::new(Tag::Pre).with_text(record.result.as_str()));

    Some([
        EnrichmentSlot {
            address: record.source_address.clone(),
            cell: source,
        },
        EnrichmentSlot {
            address: record.destination_address.clone(),
            cell: destination,
        },
    ])
}

/// Address cell and its optional port span
fn endpoint_cell(protocol: &str, address: &str, port: &str) -> (Element, Option<Element>) {
    let endpoint = format_endpoint(protocol, address, port);
    let cell = Element::new(Tag::Cell).with_text(endpoint.address);
    let port = endpoint
        .port
        .map(|port| Element::new(Tag::Span).with_class(PORT_CLASS).with_text(port));
    (cell, port)
}

fn append_endpoint(
    surface: &mut RenderSurface,
    row: ElementId,
    (cell, port): (Element, Option<Element>),
) -> Option<ElementId> {
    let cell = surface.append_child(row, cell)?;
    if let Some(port) = port {
        surface.append_child(cell, port)?;
    }
    Some(cell)
}

async fn enrich(backend: &dyn QueryBackend, surface: &RefCell<RenderSurface>, slot: EnrichmentSlot) {
    match backend::reverse_dns(backend, &slot.address).await {
        Ok(hostname) => {
            let hostname = Element::new(Tag::Span)
                .with_class(HOSTNAME_CLASS)
                .with_text(hostname);
            if surface.borrow_mut().append_child(slot.cell, hostname).is_none() {
                log::debug!(
                    "Dropping hostname of {}: result set was replaced",
                    slot.address
                );
            }
        }
        Err(e) => {
            log::debug!("Reverse DNS lookup for {} failed: {:#}", slot.address, e);
        }
    }
}
