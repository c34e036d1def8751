use std::{
    convert::Infallible,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    task::{Context, Poll},
    time::Duration,
};

use beacon_client::{
    api::{ChainHeadProvider, HeadEventsProvider, StateProvider},
    rpc::prysm_rpc::proto,
    types::{HeadEvent, Root, StateId, ValidatorStatus},
    Backend, BeaconClient, Config,
};
use futures::stream;
use parking_lot::Mutex;
use tokio::{net::TcpListener, sync::mpsc};
use tokio_util::sync::CancellationToken;
use tonic::{
    body::BoxBody,
    codec::ProstCodec,
    codegen::{http, Body, BoxFuture, Service, StdError},
    server::{Grpc, NamedService, ServerStreamingService, UnaryService},
    transport::Server,
    Status,
};

const SLOTS_PER_EPOCH: u64 = 32;
const HEAD_SLOT: u64 = 70;
const FIRST_STREAMED_SLOT: u64 = 100;

/// An in-process `BeaconChain` service. Listings come in two pages and the head stream is closed
/// by the server after every head it sends.
#[derive(Clone, Default)]
struct FakeBeaconChain {
    validator_pages: Arc<Mutex<Vec<String>>>,
    balance_pages: Arc<Mutex<Vec<String>>>,
    streams_opened: Arc<AtomicU64>,
}

impl NamedService for FakeBeaconChain {
    const NAME: &'static str = "ethereum.eth.v1alpha1.BeaconChain";
}

fn bytes(byte: u8, len: usize) -> Vec<u8> {
    vec![byte; len]
}

fn state_root_at(slot: u64) -> Vec<u8> {
    bytes((slot as u8).wrapping_add(1), 32)
}

fn head(slot: u64) -> proto::ChainHead {
    proto::ChainHead {
        head_slot: slot,
        head_epoch: slot / SLOTS_PER_EPOCH,
        head_block_root: bytes(slot as u8, 32),
        finalized_slot: 32,
        finalized_epoch: 1,
        finalized_block_root: bytes(0x20, 32),
        justified_slot: 64,
        justified_epoch: 2,
        justified_block_root: bytes(0x40, 32),
        previous_justified_slot: 32,
        previous_justified_epoch: 1,
        previous_justified_block_root: bytes(0x20, 32),
    }
}

fn beacon_config() -> proto::BeaconConfig {
    proto::BeaconConfig {
        config: [
            ("SlotsPerEpoch", "32"),
            ("SecondsPerSlot", "12"),
            ("FarFutureEpoch", "18446744073709551615"),
            ("GenesisForkVersion", "[0 0 0 0]"),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect(),
    }
}

/// Blocks are keyed by the first byte of their root, which is also their slot.
fn blocks(request: proto::ListBlocksRequest) -> proto::ListBlocksResponse {
    let slot = match request.query_filter {
        Some(proto::BlockFilter::Root(root)) => u64::from(root[0]),
        Some(proto::BlockFilter::Slot(slot)) => slot,
        _ => return proto::ListBlocksResponse::default(),
    };
    proto::ListBlocksResponse {
        block_containers: vec![proto::BeaconBlockContainer {
            block: Some(proto::SignedBeaconBlock {
                block: Some(proto::BeaconBlock {
                    slot,
                    state_root: state_root_at(slot),
                    ..Default::default()
                }),
                signature: bytes(0, 96),
            }),
            block_root: bytes(slot as u8, 32),
        }],
        next_page_token: String::new(),
        total_size: 1,
    }
}

/// Indices 0 and 1 on the first page, 2 on the second.
fn page(token: &str) -> (Vec<u64>, String) {
    match token {
        "" => (vec![0, 1], "2".to_string()),
        _ => (vec![2], String::new()),
    }
}

fn validator(index: u64) -> proto::Validator {
    proto::Validator {
        public_key: bytes(index as u8 + 1, 48),
        withdrawal_credentials: bytes(0, 32),
        effective_balance: 32_000_000_000,
        slashed: false,
        activation_eligibility_epoch: 0,
        activation_epoch: 0,
        exit_epoch: u64::MAX,
        withdrawable_epoch: u64::MAX,
    }
}

impl FakeBeaconChain {
    fn validators(&self, request: proto::ListValidatorsRequest) -> proto::Validators {
        self.validator_pages.lock().push(request.page_token.clone());
        let (indices, next_page_token) = page(&request.page_token);
        proto::Validators {
            epoch: HEAD_SLOT / SLOTS_PER_EPOCH,
            validator_list: indices
                .into_iter()
                .map(|index| proto::ValidatorContainer {
                    index,
                    validator: Some(validator(index)),
                })
                .collect(),
            next_page_token,
            total_size: 3,
        }
    }

    fn balances(&self, request: proto::ListValidatorBalancesRequest) -> proto::ValidatorBalances {
        self.balance_pages.lock().push(request.page_token.clone());
        let (indices, next_page_token) = page(&request.page_token);
        proto::ValidatorBalances {
            epoch: HEAD_SLOT / SLOTS_PER_EPOCH,
            balances: indices
                .into_iter()
                .map(|index| proto::Balance {
                    public_key: bytes(index as u8 + 1, 48),
                    index,
                    balance: 32_000_000_000 + index,
                    status: "ACTIVE".to_string(),
                })
                .collect(),
            next_page_token,
            total_size: 3,
        }
    }
}

struct Unary<F>(F);

impl<Req, Resp, F> UnaryService<Req> for Unary<F>
where
    F: FnMut(Req) -> Result<Resp, Status>,
    Resp: Send + 'static,
{
    type Response = Resp;
    type Future = BoxFuture<tonic::Response<Resp>, Status>;

    fn call(&mut self, request: tonic::Request<Req>) -> Self::Future {
        let response = (self.0)(request.into_inner()).map(tonic::Response::new);
        Box::pin(async move { response })
    }
}

fn unary<B, Req, Resp, F>(
    request: http::Request<B>,
    handler: F,
) -> BoxFuture<http::Response<BoxBody>, Infallible>
where
    B: Body + Send + 'static,
    B::Error: Into<StdError> + Send + 'static,
    Req: prost::Message + Default + Send + 'static,
    Resp: prost::Message + Send + 'static,
    F: FnMut(Req) -> Result<Resp, Status> + Send + 'static,
{
    Box::pin(async move {
        let mut grpc = Grpc::new(ProstCodec::<Resp, Req>::default());
        Ok(grpc.unary(Unary(handler), request).await)
    })
}

/// One head per stream, then a clean end of stream.
struct HeadStream(FakeBeaconChain);

impl ServerStreamingService<proto::Empty> for HeadStream {
    type Response = proto::ChainHead;
    type ResponseStream = stream::Iter<std::vec::IntoIter<Result<proto::ChainHead, Status>>>;
    type Future = BoxFuture<tonic::Response<Self::ResponseStream>, Status>;

    fn call(&mut self, _request: tonic::Request<proto::Empty>) -> Self::Future {
        let opened = self.0.streams_opened.fetch_add(1, Ordering::SeqCst);
        let heads = vec![Ok(head(FIRST_STREAMED_SLOT + opened))];
        Box::pin(async move { Ok(tonic::Response::new(stream::iter(heads))) })
    }
}

impl<B> Service<http::Request<B>> for FakeBeaconChain
where
    B: Body + Send + 'static,
    B::Error: Into<StdError> + Send + 'static,
{
    type Response = http::Response<BoxBody>;
    type Error = Infallible;
    type Future = BoxFuture<Self::Response, Self::Error>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: http::Request<B>) -> Self::Future {
        let node = self.clone();
        let path = request.uri().path().to_string();
        match path.as_str() {
            "/ethereum.eth.v1alpha1.BeaconChain/GetBeaconConfig" => {
                unary(request, |_: proto::Empty| Ok(beacon_config()))
            }
            "/ethereum.eth.v1alpha1.BeaconChain/GetChainHead" => {
                unary(request, |_: proto::Empty| Ok(head(HEAD_SLOT)))
            }
            "/ethereum.eth.v1alpha1.BeaconChain/ListBlocks" => {
                unary(request, |request: proto::ListBlocksRequest| Ok(blocks(request)))
            }
            "/ethereum.eth.v1alpha1.BeaconChain/ListValidators" => {
                unary(request, move |request: proto::ListValidatorsRequest| {
                    Ok(node.validators(request))
                })
            }
            "/ethereum.eth.v1alpha1.BeaconChain/ListValidatorBalances" => {
                unary(request, move |request: proto::ListValidatorBalancesRequest| {
                    Ok(node.balances(request))
                })
            }
            "/ethereum.eth.v1alpha1.BeaconChain/StreamChainHead" => Box::pin(async move {
                let mut grpc = Grpc::new(ProstCodec::<proto::ChainHead, proto::Empty>::default());
                Ok(grpc.server_streaming(HeadStream(node), request).await)
            }),
            _ => unary(request, |_: proto::Empty| {
                Err::<proto::Empty, _>(Status::unimplemented("unknown method"))
            }),
        }
    }
}

async fn serve(node: FakeBeaconChain) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = format!("http://{}", listener.local_addr().unwrap());
    let incoming = Box::pin(stream::unfold(listener, |listener| async move {
        let accepted = listener.accept().await.map(|(socket, _)| socket);
        Some((accepted, listener))
    }));
    tokio::spawn(
        Server::builder()
            .add_service(node)
            .serve_with_incoming(incoming),
    );
    address
}

async fn connect(node: &FakeBeaconChain, cancel: CancellationToken) -> BeaconClient {
    let address = serve(node.clone()).await;
    BeaconClient::connect(&Config::new(address, Backend::Prysm), cancel)
        .await
        .unwrap()
}

#[test_log::test(tokio::test)]
async fn chain_head_takes_state_root_from_the_head_block() {
    let node = FakeBeaconChain::default();
    let client = connect(&node, CancellationToken::new()).await;

    let head = client.chain_head().await.unwrap();
    assert_eq!(head.slot, HEAD_SLOT);
    assert_eq!(head.block_root, Root::new([HEAD_SLOT as u8; 32]));
    assert_eq!(head.state_root, Root::new([HEAD_SLOT as u8 + 1; 32]));
    assert_eq!(head.finalized_slot, 32);
}

#[test_log::test(tokio::test)]
async fn listings_follow_page_tokens() {
    let node = FakeBeaconChain::default();
    let client = connect(&node, CancellationToken::new()).await;

    let validators = client.validators(StateId::Head, &[]).await.unwrap();
    assert_eq!(validators.len(), 3);
    assert_eq!(validators[&2].balance, 32_000_000_002);
    assert_eq!(validators[&1].status, ValidatorStatus::ActiveOngoing);
    assert_eq!(*node.validator_pages.lock(), vec!["", "2"]);
    assert_eq!(*node.balance_pages.lock(), vec!["", "2"]);

    let balances = client
        .validator_balances(StateId::Slot(HEAD_SLOT), &[])
        .await
        .unwrap();
    assert_eq!(balances.len(), 3);
    assert_eq!(balances[&0], 32_000_000_000);
}

#[test_log::test(tokio::test)]
async fn closed_head_stream_is_reopened() {
    let node = FakeBeaconChain::default();
    let cancel = CancellationToken::new();
    let client = connect(&node, cancel.clone()).await;

    let (sender, mut receiver) = mpsc::unbounded_channel();
    client
        .on_head(Arc::new(move |event: HeadEvent| {
            let sender = sender.clone();
            async move {
                sender.send(event)?;
                Ok::<_, anyhow::Error>(())
            }
        }))
        .await
        .unwrap();

    for offset in 0..2 {
        let event = tokio::time::timeout(Duration::from_secs(10), receiver.recv())
            .await
            .unwrap()
            .unwrap();
        let slot = FIRST_STREAMED_SLOT + offset;
        assert_eq!(event.slot, slot);
        assert_eq!(event.block_root, Root::new([slot as u8; 32]));
        assert_eq!(event.state_root, Root::new([slot as u8 + 1; 32]));
    }
    assert!(node.streams_opened.load(Ordering::SeqCst) >= 2);
    cancel.cancel();
}
