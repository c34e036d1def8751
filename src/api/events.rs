//! Fan-out of a single upstream head source to any number of handlers.

use std::{future::Future, sync::Arc, time::Duration};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tokio::time::{interval, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, Instrument, Span};

use super::ChainHeadProvider;
use crate::{
    errors::{ClientError, Result},
    types::{HeadEvent, HeadUpdate, Root, Slot},
};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

#[async_trait]
pub trait HeadEventHandler: Send + Sync {
    async fn handle(&self, event: HeadEvent) -> anyhow::Result<()>;
}

#[async_trait]
impl<F, Fut> HeadEventHandler for F
where
    F: Fn(HeadEvent) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn handle(&self, event: HeadEvent) -> anyhow::Result<()> {
        self(event).await
    }
}

/// Upstream of head observations: a server push stream or a poll loop.
#[async_trait]
pub trait HeadSource: Send + 'static {
    /// `Ok(None)` once the source is exhausted.
    async fn next_head(&mut self) -> Result<Option<HeadUpdate>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistributorState {
    Idle,
    Streaming,
    Closed,
}

type Handlers = Arc<RwLock<Vec<Arc<dyn HeadEventHandler>>>>;

/// One per adapter. The upstream source starts on the first registration and runs until the
/// cancellation token fires. A source that ends on its own returns the distributor to `Idle`, so
/// the next registration starts a fresh one for every handler.
#[derive(Clone)]
pub struct HeadEventDistributor {
    handlers: Handlers,
    state: Arc<Mutex<DistributorState>>,
    cancel: CancellationToken,
    span: Span,
}

impl HeadEventDistributor {
    pub fn new(cancel: CancellationToken, span: Span) -> Self {
        Self {
            handlers: Arc::new(RwLock::new(Vec::new())),
            state: Arc::new(Mutex::new(DistributorState::Idle)),
            cancel,
            span,
        }
    }

    pub fn state(&self) -> DistributorState {
        *self.state.lock()
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.read().len()
    }

    /// Adds `handler`. `make_source` is only called, and the background task only spawned, when
    /// this is the first registration.
    pub fn register<S, F>(
        &self,
        handler: Arc<dyn HeadEventHandler>,
        slots_per_epoch: u64,
        make_source: F,
    ) -> Result<()>
    where
        S: HeadSource,
        F: FnOnce() -> Result<S>,
    {
        let mut state = self.state.lock();
        match *state {
            DistributorState::Closed => return Err(ClientError::Cancelled),
            DistributorState::Streaming => {
                self.handlers.write().push(handler);
                return Ok(());
            }
            DistributorState::Idle => {}
        }

        let source = make_source()?;
        self.handlers.write().push(handler);
        *state = DistributorState::Streaming;
        drop(state);

        info!("starting head event stream");
        tokio::spawn(
            run(
                source,
                self.handlers.clone(),
                self.state.clone(),
                self.cancel.clone(),
                slots_per_epoch,
                self.span.clone(),
            )
            .instrument(self.span.clone()),
        );
        Ok(())
    }
}

async fn run<S: HeadSource>(
    mut source: S,
    handlers: Handlers,
    state: Arc<Mutex<DistributorState>>,
    cancel: CancellationToken,
    slots_per_epoch: u64,
    span: Span,
) {
    let mut previous_slot: Option<Slot> = None;
    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => {
                debug!("head event stream cancelled");
                break;
            }
            next = source.next_head() => next,
        };

        match next {
            Ok(Some(update)) => {
                let event = update.into_event(previous_slot, slots_per_epoch);
                previous_slot = Some(update.slot);
                notify(&handlers, event, &span);
            }
            Ok(None) => {
                info!("head source ended");
                break;
            }
            Err(err) if err.is_cancelled() => break,
            Err(err) => warn!(%err, "failed to receive head update"),
        }
    }
    *state.lock() = if cancel.is_cancelled() {
        DistributorState::Closed
    } else {
        DistributorState::Idle
    };
}

fn notify(handlers: &Handlers, event: HeadEvent, span: &Span) {
    let handlers = handlers.read().clone();
    debug!(
        slot = event.slot,
        block_root = %event.block_root,
        epoch_transition = event.epoch_transition,
        handlers = handlers.len(),
        "dispatching head event"
    );
    for handler in handlers {
        tokio::spawn(
            async move {
                if let Err(err) = handler.handle(event).await {
                    warn!(slot = event.slot, "head event handler failed: {err:?}");
                }
            }
            .instrument(span.clone()),
        );
    }
}

/// Synthesizes head updates by fetching the chain head on a fixed interval and reporting every
/// change of block root, starting with the first observation.
pub struct PollingHeadSource<P> {
    provider: P,
    interval: Interval,
    last_block_root: Option<Root>,
}

impl<P> PollingHeadSource<P> {
    pub fn new(provider: P, period: Duration) -> Self {
        let mut interval = interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            provider,
            interval,
            last_block_root: None,
        }
    }
}

#[async_trait]
impl<P> HeadSource for PollingHeadSource<P>
where
    P: ChainHeadProvider + 'static,
{
    async fn next_head(&mut self) -> Result<Option<HeadUpdate>> {
        loop {
            self.interval.tick().await;
            let head = self.provider.chain_head().await?;
            if self.last_block_root == Some(head.block_root) {
                continue;
            }
            self.last_block_root = Some(head.block_root);
            return Ok(Some(HeadUpdate {
                slot: head.slot,
                block_root: head.block_root,
                state_root: head.state_root,
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

    use anyhow::anyhow;
    use tokio::sync::mpsc;

    use super::*;
    use crate::types::ChainHead;

    struct ChannelSource(mpsc::UnboundedReceiver<HeadUpdate>);

    #[async_trait]
    impl HeadSource for ChannelSource {
        async fn next_head(&mut self) -> Result<Option<HeadUpdate>> {
            Ok(self.0.recv().await)
        }
    }

    fn update(slot: Slot) -> HeadUpdate {
        HeadUpdate {
            slot,
            block_root: Root::new([slot as u8; 32]),
            state_root: Root::new([2; 32]),
        }
    }

    fn recording_handler(
        sink: mpsc::UnboundedSender<(usize, HeadEvent)>,
        id: usize,
    ) -> Arc<dyn HeadEventHandler> {
        Arc::new(move |event: HeadEvent| {
            let sink = sink.clone();
            async move {
                sink.send((id, event))?;
                Ok::<_, anyhow::Error>(())
            }
        })
    }

    async fn ignore(_event: HeadEvent) -> anyhow::Result<()> {
        Ok(())
    }

    async fn explode(_event: HeadEvent) -> anyhow::Result<()> {
        panic!("handler panic")
    }

    #[test_log::test(tokio::test)]
    async fn every_handler_is_notified_despite_failures() {
        let distributor = HeadEventDistributor::new(CancellationToken::new(), Span::none());
        let (upstream, receiver) = mpsc::unbounded_channel();
        let (sink, mut received) = mpsc::unbounded_channel();

        distributor
            .register(recording_handler(sink.clone(), 1), 32, || {
                Ok(ChannelSource(receiver))
            })
            .unwrap();
        let failing: Arc<dyn HeadEventHandler> = Arc::new({
            let sink = sink.clone();
            move |event: HeadEvent| {
                let sink = sink.clone();
                async move {
                    sink.send((2, event))?;
                    Err::<(), _>(anyhow!("handler failure"))
                }
            }
        });
        distributor
            .register(failing, 32, || -> Result<ChannelSource> { unreachable!() })
            .unwrap();
        distributor
            .register(Arc::new(explode), 32, || -> Result<ChannelSource> { unreachable!() })
            .unwrap();
        distributor
            .register(recording_handler(sink, 3), 32, || -> Result<ChannelSource> {
                unreachable!()
            })
            .unwrap();
        assert_eq!(distributor.handler_count(), 4);

        upstream.send(update(10)).unwrap();

        let mut events = Vec::new();
        for _ in 0..3 {
            events.push(received.recv().await.unwrap());
        }
        events.sort_by_key(|(id, _)| *id);
        assert_eq!(
            events.iter().map(|(id, _)| *id).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert!(events.windows(2).all(|pair| pair[0].1 == pair[1].1));
        assert_eq!(events[0].1.slot, 10);
        assert!(!events[0].1.epoch_transition);

        upstream.send(update(32)).unwrap();
        let (_, next) = received.recv().await.unwrap();
        assert!(next.epoch_transition);
    }

    #[tokio::test]
    async fn concurrent_registration_starts_source_once() {
        let distributor = HeadEventDistributor::new(CancellationToken::new(), Span::none());
        let sources_started = Arc::new(AtomicUsize::new(0));
        let senders = Arc::new(Mutex::new(Vec::new()));

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let distributor = distributor.clone();
                let sources_started = sources_started.clone();
                let senders = senders.clone();
                tokio::spawn(async move {
                    distributor.register(Arc::new(ignore), 32, move || {
                        sources_started.fetch_add(1, Ordering::SeqCst);
                        let (sender, receiver) = mpsc::unbounded_channel();
                        senders.lock().push(sender);
                        Ok(ChannelSource(receiver))
                    })
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(sources_started.load(Ordering::SeqCst), 1);
        assert_eq!(distributor.handler_count(), 16);
        assert_eq!(distributor.state(), DistributorState::Streaming);
    }

    #[tokio::test]
    async fn cancellation_closes_the_distributor() {
        let cancel = CancellationToken::new();
        let distributor = HeadEventDistributor::new(cancel.clone(), Span::none());
        let (_upstream, receiver) = mpsc::unbounded_channel();
        let handler: Arc<dyn HeadEventHandler> = Arc::new(ignore);
        distributor
            .register(handler.clone(), 32, || Ok(ChannelSource(receiver)))
            .unwrap();

        cancel.cancel();
        for _ in 0..100 {
            if distributor.state() == DistributorState::Closed {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(distributor.state(), DistributorState::Closed);
        assert!(matches!(
            distributor.register(handler, 32, || -> Result<ChannelSource> { unreachable!() }),
            Err(ClientError::Cancelled)
        ));
    }

    #[test_log::test(tokio::test)]
    async fn exhausted_source_is_restarted_by_the_next_registration() {
        let distributor = HeadEventDistributor::new(CancellationToken::new(), Span::none());
        let (upstream, receiver) = mpsc::unbounded_channel();
        let (sink, mut received) = mpsc::unbounded_channel();
        distributor
            .register(recording_handler(sink.clone(), 1), 32, || {
                Ok(ChannelSource(receiver))
            })
            .unwrap();

        drop(upstream);
        for _ in 0..100 {
            if distributor.state() == DistributorState::Idle {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(distributor.state(), DistributorState::Idle);

        let (upstream, receiver) = mpsc::unbounded_channel();
        distributor
            .register(recording_handler(sink, 2), 32, || Ok(ChannelSource(receiver)))
            .unwrap();
        assert_eq!(distributor.state(), DistributorState::Streaming);

        upstream.send(update(40)).unwrap();
        let mut ids = vec![
            received.recv().await.unwrap().0,
            received.recv().await.unwrap().0,
        ];
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2]);
    }

    struct SteppingChain {
        slot: AtomicU64,
    }

    #[async_trait]
    impl ChainHeadProvider for SteppingChain {
        async fn chain_head(&self) -> Result<ChainHead> {
            // Advances every other poll, so half the observations repeat the previous head.
            let tick = self.slot.fetch_add(1, Ordering::SeqCst);
            let slot = tick / 2;
            Ok(ChainHead {
                slot,
                block_root: Root::new([slot as u8; 32]),
                state_root: Root::zero(),
                finalized_slot: 0,
                finalized_block_root: Root::zero(),
                justified_slot: 0,
                justified_block_root: Root::zero(),
            })
        }

        async fn slot_for_block_root(&self, _root: Root) -> Result<Slot> {
            Ok(0)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn polling_reports_only_root_changes() {
        let chain = Arc::new(SteppingChain {
            slot: AtomicU64::new(0),
        });
        let mut source = PollingHeadSource::new(chain.clone(), DEFAULT_POLL_INTERVAL);

        let first = source.next_head().await.unwrap().unwrap();
        let second = source.next_head().await.unwrap().unwrap();
        let third = source.next_head().await.unwrap().unwrap();
        assert_eq!((first.slot, second.slot, third.slot), (0, 1, 2));
        assert_eq!(chain.slot.load(Ordering::SeqCst), 5);
    }
}
