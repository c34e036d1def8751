use async_trait::async_trait;
use eventsource_client::{BoxStream, Client, ClientBuilder, Error as EventSourceError, SSE};
use futures::StreamExt;
use tracing::trace;
use url::Url;

use super::http_client::join_endpoint;
use crate::{
    api::events::HeadSource,
    errors::{ClientError, Result, TransportError},
    types::{HeadEvent, HeadUpdate},
};

pub const HEAD_TOPIC: &str = "head";

/// Head updates pushed by the node over `/eth/v1/events`.
pub struct SseHeadSource {
    stream: BoxStream<std::result::Result<SSE, EventSourceError>>,
}

impl SseHeadSource {
    pub fn connect(base_url: &Url) -> Result<Self> {
        let endpoint = join_endpoint(base_url, &format!("/eth/v1/events?topics={HEAD_TOPIC}"))?;
        let client = ClientBuilder::for_url(endpoint.as_str())
            .map_err(|err| TransportError::EventStream(format!("{err:?}")))?
            .build();
        Ok(Self {
            stream: client.stream(),
        })
    }
}

/// Decodes the payload of a `head` event.
pub fn parse_head_event(data: &str) -> Result<HeadUpdate> {
    let event: HeadEvent =
        serde_json::from_str(data).map_err(|err| ClientError::decoding("head event", err))?;
    Ok(HeadUpdate {
        slot: event.slot,
        block_root: event.block_root,
        state_root: event.state_root,
    })
}

#[async_trait]
impl HeadSource for SseHeadSource {
    async fn next_head(&mut self) -> Result<Option<HeadUpdate>> {
        while let Some(item) = self.stream.next().await {
            match item {
                Ok(SSE::Event(event)) if event.event_type == HEAD_TOPIC => {
                    return parse_head_event(&event.data).map(Some);
                }
                Ok(other) => trace!("ignoring event stream item: {other:?}"),
                Err(err) => return Err(TransportError::EventStream(format!("{err:?}")).into()),
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Root;

    #[test]
    fn head_payload() {
        let update = parse_head_event(
            r#"{"slot":"4096","block":"0x0101010101010101010101010101010101010101010101010101010101010101","state":"0x0202020202020202020202020202020202020202020202020202020202020202","epoch_transition":true,"execution_optimistic":false}"#,
        )
        .unwrap();
        assert_eq!(update.slot, 4096);
        assert_eq!(update.block_root, Root::new([1; 32]));
        assert_eq!(update.state_root, Root::new([2; 32]));
    }

    #[test]
    fn malformed_payload() {
        assert!(matches!(
            parse_head_event(r#"{"slot":4096}"#),
            Err(ClientError::Decoding { .. })
        ));
    }
}
