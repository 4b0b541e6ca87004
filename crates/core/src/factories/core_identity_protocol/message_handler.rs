use super::*;
use std::sync::Weak;

/// Answers inbound identity requests.
#[derive(Debug)]
pub(super) struct RequestHandler(pub(super) Weak<Inner>);

impl StreamHandler for RequestHandler {
    fn handle_stream(&self, stream: DynInboundStream) -> BoxFut<'_, ()> {
        Box::pin(async move {
            if let Some(inner) = self.0.upgrade() {
                inner.on_request(stream).await;
            }
        })
    }
}

/// Routes inbound identity responses to their pending request.
#[derive(Debug)]
pub(super) struct ResponseHandler(pub(super) Weak<Inner>);

impl StreamHandler for ResponseHandler {
    fn handle_stream(&self, stream: DynInboundStream) -> BoxFut<'_, ()> {
        Box::pin(async move {
            if let Some(inner) = self.0.upgrade() {
                inner.on_response(stream).await;
            }
        })
    }
}

/// Read the whole body of a single-message stream, closing it on
/// success and resetting it on failure.
async fn read_message(mut stream: DynInboundStream) -> Option<bytes::Bytes> {
    match stream.read_to_end().await {
        Ok(data) => {
            stream.close();
            Some(data)
        }
        Err(err) => {
            tracing::warn!(?err, peer = %stream.remote_peer(), protocol = %stream.protocol(), "failed to read stream");
            stream.reset();
            None
        }
    }
}

impl Inner {
    pub(super) async fn on_request(&self, stream: DynInboundStream) {
        let remote = stream.remote_peer();
        tracing::trace!(%remote, "receiving identity request");

        let Some(data) = read_message(stream).await else {
            return;
        };

        let request = match IdentityRequest::decode_checked(data) {
            Ok(request) => request,
            Err(err) => {
                tracing::warn!(?err, %remote, "dropping malformed identity request");
                return;
            }
        };

        // decode_checked validated the subject
        let subject = match request.subject() {
            Ok(subject) => subject,
            Err(_) => return,
        };

        let mut identities: Vec<HashHex> = self
            .index
            .all(&subject)
            .into_iter()
            .map(|h| h.hex())
            .collect();
        identities.sort();

        let count = identities.len();
        let response = IdentityResponse::create(
            &self.transport.peer_id(),
            request.request_id().to_string(),
            &subject,
            identities,
        );

        match self
            .transport
            .send(
                remote.clone(),
                IDENTITY_RESPONSE_PROTOCOL,
                response.encode_to_bytes(),
            )
            .await
        {
            Ok(()) => tracing::debug!(
                %remote,
                %subject,
                request_id = %request.request_id(),
                count,
                "identity response sent"
            ),
            Err(err) => tracing::warn!(
                ?err,
                %remote,
                request_id = %request.request_id(),
                "failed to send identity response"
            ),
        }
    }

    pub(super) async fn on_response(&self, stream: DynInboundStream) {
        let remote = stream.remote_peer();
        tracing::trace!(%remote, "receiving identity response");

        let Some(data) = read_message(stream).await else {
            return;
        };

        let response = match IdentityResponse::decode_checked(data) {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(?err, %remote, "dropping malformed identity response");
                return;
            }
        };

        let identities = match response.identities() {
            Ok(identities) => identities,
            Err(err) => {
                tracing::warn!(?err, %remote, "dropping identity response with bad identity hex");
                return;
            }
        };

        let request_id = response.request_id().to_string();

        let claimed = response.sender();
        let subject = response.subject().ok();

        let pending = {
            let mut lock = self.pending.lock().unwrap();
            let verdict = match lock.get(&request_id) {
                None => Err("no pending request"),
                Some(p) if p.peer != remote || claimed != remote => {
                    Err("unexpected peer")
                }
                Some(p) if subject.as_ref() != Some(&p.subject) => {
                    Err("wrong subject")
                }
                Some(_) => Ok(()),
            };
            if let Err(reason) = verdict {
                tracing::warn!(%remote, %claimed, %request_id, reason, "dropping identity response");
                return;
            }
            lock.remove(&request_id)
        };

        let Some(pending) = pending else {
            return;
        };

        let count = identities.len();
        let (response_tx, out) = pending
            .into_response(request_id, PullOutcome::Identities(identities));

        tracing::debug!(%remote, subject = %out.subject, request_id = %out.request_id, count, "identity response received");

        if response_tx.send(out).await.is_err() {
            tracing::debug!(%remote, "pull response receiver dropped");
        }
    }
}
