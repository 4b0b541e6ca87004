//! Per-subject gossip subscriptions.
//!
//! Activating a subject subscribes to its `identity/<hex>` and
//! `vote/<hex>` topics and starts one listener task for each.
//!
//! - The identity listener decodes each message as an identity digest
//!   and merges it into the [IdentityIndex]. Already known identities
//!   are ignored, so the merge can be applied in any order, any number
//!   of times.
//! - The vote listener appends each message to a per-topic log that is
//!   read back with [CoreSubscriber::drain_messages].
//!
//! A listener stops at the first subscription error and is not
//! restarted. Deactivating a subject, [CoreSubscriber::shutdown] or
//! dropping the subscriber aborts the listeners and cancels the
//! subscriptions.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::task::AbortHandle;
use zkvote_api::*;

type MessageLog = Arc<Mutex<HashMap<String, Vec<PubSubMessage>>>>;

/// The live subscriptions of one subject.
#[derive(Debug)]
struct SubjectSubs {
    subject: SubjectHash,
    info: Subject,
    identity_sub: DynSubscription,
    vote_sub: DynSubscription,
    tasks: Vec<AbortHandle>,
}

impl Drop for SubjectSubs {
    fn drop(&mut self) {
        for task in self.tasks.iter() {
            task.abort();
        }
        self.identity_sub.cancel();
        self.vote_sub.cancel();
    }
}

/// Maintains the gossip subscriptions of every active subject.
#[derive(Debug)]
pub struct CoreSubscriber {
    pubsub: DynPubSub,
    index: DynIdentityIndex,
    subs: Mutex<HashMap<HashHex, SubjectSubs>>,
    messages: MessageLog,
}

impl Drop for CoreSubscriber {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl CoreSubscriber {
    /// Construct a subscriber with no active subjects.
    pub fn create(pubsub: DynPubSub, index: DynIdentityIndex) -> Arc<Self> {
        Arc::new(Self {
            pubsub,
            index,
            subs: Mutex::new(HashMap::new()),
            messages: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Subscribe to the topics of `subject`, labelled with its title.
    /// Does nothing if the subject is already active.
    pub fn activate(&self, subject: &Subject) -> ZkvResult<SubjectHash> {
        let hash = subject.hash();
        self.ensure_active(&hash, subject)?;
        Ok(hash)
    }

    fn ensure_active(
        &self,
        subject: &SubjectHash,
        info: &Subject,
    ) -> ZkvResult<()> {
        let key = subject.hex();

        // the lock spans the check and both subscribes
        let mut lock = self.subs.lock().unwrap();
        if lock.contains_key(&key) {
            return Ok(());
        }

        let identity_sub = self.pubsub.subscribe(&identity_topic(&key))?;
        let vote_sub = self.pubsub.subscribe(&vote_topic(&key))?;

        let tasks = vec![
            spawn_identity_listener(
                subject.clone(),
                identity_sub.clone(),
                self.index.clone(),
            ),
            spawn_vote_listener(vote_sub.clone(), self.messages.clone()),
        ];

        tracing::info!(%subject, label = %info.title, "subject activated");

        lock.insert(
            key,
            SubjectSubs {
                subject: subject.clone(),
                info: info.clone(),
                identity_sub,
                vote_sub,
                tasks,
            },
        );

        Ok(())
    }

    /// Register an identity commitment under a subject.
    ///
    /// Activates the subject if needed, with its hex as the label, inserts
    /// the identity into the local index and announces its digest on the
    /// identity topic.
    pub async fn register(
        &self,
        subject_hex: &str,
        commitment: &str,
    ) -> ZkvResult<IdentityHash> {
        let subject = SubjectHash::from_hex(subject_hex)?;
        let key = subject.hex();

        let info = Subject::new(key.to_string(), "");
        self.ensure_active(&subject, &info)?;

        let identity = Identity::new(commitment).hash();
        if self.index.insert(&subject, &identity) {
            tracing::info!(%subject, %identity, "registered local identity");
        }

        self.pubsub
            .publish(&identity_topic(&key), bytes::Bytes::clone(&identity.0))
            .await?;

        Ok(identity)
    }

    /// Publish opaque vote data for an active subject.
    pub async fn vote(
        &self,
        subject_hex: &str,
        payload: bytes::Bytes,
    ) -> ZkvResult<()> {
        let key = SubjectHash::from_hex(subject_hex)?.hex();
        if !self.subs.lock().unwrap().contains_key(&key) {
            return Err(ZkvError::not_ready(format!(
                "subject {key} is not active"
            )));
        }
        self.pubsub.publish(&vote_topic(&key), payload).await
    }

    /// Publish raw data on any topic.
    pub async fn broadcast(
        &self,
        topic: &str,
        data: bytes::Bytes,
    ) -> ZkvResult<()> {
        self.pubsub.publish(topic, data).await
    }

    /// Take every message logged for `topic` so far, oldest first.
    pub fn drain_messages(&self, topic: &str) -> Vec<PubSubMessage> {
        self.messages
            .lock()
            .unwrap()
            .remove(topic)
            .unwrap_or_default()
    }

    /// Topics with logged messages waiting to be drained.
    pub fn message_topics(&self) -> Vec<String> {
        let mut out: Vec<String> = self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, m)| !m.is_empty())
            .map(|(t, _)| t.clone())
            .collect();
        out.sort();
        out
    }

    /// Stop following a subject. Returns `false` if it was not active.
    /// Identities already merged into the index stay there.
    pub fn deactivate(&self, subject_hex: &str) -> ZkvResult<bool> {
        let key = SubjectHash::from_hex(subject_hex)?.hex();
        let removed = self.subs.lock().unwrap().remove(&key);
        match removed {
            Some(subs) => {
                tracing::info!(subject = %subs.subject, "subject deactivated");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Deactivate every subject.
    pub fn shutdown(&self) {
        let all: Vec<SubjectSubs> =
            self.subs.lock().unwrap().drain().map(|(_, s)| s).collect();
        if !all.is_empty() {
            tracing::info!(count = all.len(), "subscriber shut down");
        }
    }
}

impl SubjectView for CoreSubscriber {
    fn active_subjects(&self) -> Vec<(SubjectHash, Subject)> {
        let mut out: Vec<(SubjectHash, Subject)> = self
            .subs
            .lock()
            .unwrap()
            .values()
            .map(|s| (s.subject.clone(), s.info.clone()))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    fn has_subscriptions(&self) -> bool {
        !self.subs.lock().unwrap().is_empty()
    }
}

fn spawn_identity_listener(
    subject: SubjectHash,
    sub: DynSubscription,
    index: DynIdentityIndex,
) -> AbortHandle {
    tokio::spawn(async move {
        loop {
            let msg = match sub.next().await {
                Ok(msg) => msg,
                Err(err) => {
                    tracing::error!(?err, topic = %sub.topic(), "identity subscription ended");
                    break;
                }
            };

            tracing::trace!(from = %msg.from, topic = %msg.topic, "identity message");

            let identity = match IdentityHash::try_from(msg.data) {
                Ok(identity) => identity,
                Err(err) => {
                    tracing::warn!(?err, from = %msg.from, "dropping undecodable identity announcement");
                    continue;
                }
            };

            if index.insert(&subject, &identity) {
                tracing::info!(%subject, %identity, from = %msg.from, "accepted identity");
            } else {
                tracing::debug!(%subject, %identity, "identity already registered");
            }
        }
    })
    .abort_handle()
}

fn spawn_vote_listener(
    sub: DynSubscription,
    messages: MessageLog,
) -> AbortHandle {
    tokio::spawn(async move {
        loop {
            match sub.next().await {
                Ok(msg) => {
                    messages
                        .lock()
                        .unwrap()
                        .entry(msg.topic.clone())
                        .or_default()
                        .push(msg);
                }
                Err(err) => {
                    tracing::error!(?err, topic = %sub.topic(), "vote subscription ended");
                    break;
                }
            }
        }
    })
    .abort_handle()
}

#[cfg(test)]
mod test;
