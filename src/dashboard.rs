//! The dashboard view: owns the dish list and the loading flag, and wires
//! fetches, live updates and toggles together.
//!
//! Every request runs as its own task and reports back through a channel, so
//! the host loop never blocks on the network. Overlapping fetches are not
//! sequenced: whichever resolves last wins.

use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::api::DishSource;
use crate::data::{self, Dish};
use crate::live::{LiveUpdates, Signal, Subscription};
use crate::presentation::{presentation_for, Presentation};

/// What the dashboard currently shows.
#[derive(Debug, Clone, PartialEq)]
pub enum View<'a> {
    Loading,
    Grid(Vec<Card<'a>>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Card<'a> {
    /// 1-based position, used to address the card from the command line.
    pub index: usize,
    pub dish: &'a Dish,
    pub presentation: Presentation,
}

/// What `Dashboard::next_change` just applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// A fetch resolved and replaced the list.
    Loaded,
    /// A fetch failed; the list is unchanged (empty if it was the first one).
    FetchFailed,
    Connected,
    /// The server announced an update and a re-fetch is on its way.
    Refetching,
    /// The mutation for this dish failed; a re-fetch is on its way.
    ToggleFailed(String),
    LiveClosed,
}

impl Change {
    pub fn needs_redraw(&self) -> bool {
        matches!(self, Self::Loaded | Self::FetchFailed)
    }
}

enum Outcome {
    Listed(anyhow::Result<Vec<Dish>>),
    ToggleFailed { id: String, error: anyhow::Error },
}

pub struct Dashboard {
    source: Arc<dyn DishSource>,
    dishes: Vec<Dish>,
    loading: bool,
    outcome_tx: UnboundedSender<Outcome>,
    outcome_rx: UnboundedReceiver<Outcome>,
    signals: UnboundedReceiver<Signal>,
    live_open: bool,
    subscription: Subscription,
}

impl Dashboard {
    /// Start the initial fetch and open the live update subscription. Must be
    /// called inside a tokio runtime.
    pub fn mount(source: Arc<dyn DishSource>, live: &dyn LiveUpdates) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        spawn_fetch(&source, &outcome_tx);

        let (signal_tx, signals) = mpsc::unbounded_channel();
        let subscription = live.subscribe(signal_tx);

        Self {
            source,
            dishes: Vec::new(),
            loading: true,
            outcome_tx,
            outcome_rx,
            signals,
            live_open: true,
            subscription,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn dishes(&self) -> &[Dish] {
        &self.dishes
    }

    /// Dish behind the 1-based card index.
    pub fn dish_at(&self, index: usize) -> Option<&Dish> {
        index.checked_sub(1).and_then(|i| self.dishes.get(i))
    }

    pub fn find(&self, id: &str) -> Option<&Dish> {
        self.dishes.iter().find(|d| d.id == id)
    }

    pub fn view(&self) -> View<'_> {
        if self.loading {
            return View::Loading;
        }

        let cards = self
            .dishes
            .iter()
            .enumerate()
            .map(|(i, dish)| Card {
                index: i + 1,
                dish,
                presentation: presentation_for(dish.is_published),
            })
            .collect();
        View::Grid(cards)
    }

    /// Flip the dish locally right away and send the mutation in the
    /// background. A failed mutation is not rolled back; it triggers a
    /// re-fetch instead. Returns false, and sends nothing, for an unknown id.
    pub fn toggle_dish(&mut self, id: &str) -> bool {
        if !data::toggle_in(&mut self.dishes, id) {
            tracing::warn!("no dish with id {id} to toggle");
            return false;
        }

        let source = self.source.clone();
        let tx = self.outcome_tx.clone();
        let id = id.to_string();
        tokio::spawn(async move {
            if let Err(error) = source.toggle_dish(&id).await {
                let _ = tx.send(Outcome::ToggleFailed { id, error });
            }
        });
        true
    }

    /// Wait for the next fetch result, mutation failure or live signal and
    /// apply it. Cancel safe.
    pub async fn next_change(&mut self) -> Change {
        // outcome_tx lives in self, so the outcome branch never closes
        tokio::select! {
            Some(outcome) = self.outcome_rx.recv() => self.apply(outcome),
            signal = self.signals.recv(), if self.live_open => self.on_signal(signal),
        }
    }

    /// Close the live update connection. Requests still in flight are left
    /// to finish; their results go nowhere.
    pub fn unmount(mut self) {
        self.subscription.disconnect();
    }

    fn refetch(&self) {
        spawn_fetch(&self.source, &self.outcome_tx);
    }

    fn apply(&mut self, outcome: Outcome) -> Change {
        match outcome {
            Outcome::Listed(Ok(dishes)) => {
                tracing::debug!("fetched {} dishes", dishes.len());
                self.dishes = dishes;
                self.loading = false;
                Change::Loaded
            }
            Outcome::Listed(Err(e)) => {
                tracing::error!("fail to fetch dishes: {e:#}");
                self.loading = false;
                Change::FetchFailed
            }
            Outcome::ToggleFailed { id, error } => {
                tracing::error!("fail to toggle dish {id}: {error:#}");
                self.refetch();
                Change::ToggleFailed(id)
            }
        }
    }

    fn on_signal(&mut self, signal: Option<Signal>) -> Change {
        match signal {
            Some(Signal::Connected) => {
                tracing::info!("connected to live update channel");
                Change::Connected
            }
            Some(Signal::DishUpdated) => {
                tracing::info!("dish updated event received");
                self.refetch();
                Change::Refetching
            }
            None => {
                tracing::warn!("live update channel closed, no more automatic refresh");
                self.live_open = false;
                Change::LiveClosed
            }
        }
    }
}

fn spawn_fetch(source: &Arc<dyn DishSource>, tx: &UnboundedSender<Outcome>) {
    let source = source.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = source.list_dishes().await;
        // receiver is gone after unmount
        let _ = tx.send(Outcome::Listed(result));
    });
}
