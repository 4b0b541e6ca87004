use super::*;
use std::sync::Weak;
use std::time::Duration;
use tokio::task::AbortHandle;

/// Spawns a task that expires pending requests past their deadline and
/// notifies their callers. Ends once the protocol is dropped.
pub(super) fn spawn_sweep_task(
    inner: Weak<Inner>,
    interval: Duration,
) -> AbortHandle {
    tracing::debug!(?interval, "starting identity request sweep task");

    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;

            let Some(inner) = inner.upgrade() else {
                break;
            };

            let expired = take_timed_out(
                &inner.pending,
                tokio::time::Instant::now(),
            );

            // do not keep the protocol alive while callers are notified
            drop(inner);

            notify_timed_out(expired).await;
        }
    })
    .abort_handle()
}

/// Remove every pending entry whose deadline is not after `now`.
fn take_timed_out(
    pending: &Mutex<PendingMap>,
    now: tokio::time::Instant,
) -> Vec<(String, Pending)> {
    let mut lock = pending.lock().unwrap();
    let ids: Vec<String> = lock
        .iter()
        .filter(|(_, p)| p.deadline <= now)
        .map(|(id, _)| id.clone())
        .collect();
    ids.into_iter()
        .filter_map(|id| lock.remove(&id).map(|p| (id, p)))
        .collect()
}

async fn notify_timed_out(expired: Vec<(String, Pending)>) {
    for (request_id, pending) in expired {
        tracing::warn!(peer = %pending.peer, subject = %pending.subject, %request_id, "identity request timed out");
        let (response_tx, out) =
            pending.into_response(request_id, PullOutcome::TimedOut);
        let _ = response_tx.send(out).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending_entry(
        deadline: tokio::time::Instant,
    ) -> (Pending, tokio::sync::mpsc::Receiver<PullResponse>) {
        let (response_tx, response_rx) = tokio::sync::mpsc::channel(1);
        (
            Pending {
                peer: PeerId::from("p1"),
                subject: Subject::new("s", "").hash(),
                deadline,
                response_tx,
            },
            response_rx,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn expire_pending_requests() {
        let pending = Mutex::new(PendingMap::new());
        let now = tokio::time::Instant::now();

        let (p1, mut rx1) = pending_entry(now + Duration::from_secs(10));
        let (p2, _rx2) = pending_entry(now + Duration::from_secs(60));
        pending.lock().unwrap().insert("r1".into(), p1);
        pending.lock().unwrap().insert("r2".into(), p2);

        assert!(take_timed_out(&pending, now).is_empty());
        assert_eq!(2, pending.lock().unwrap().len());

        tokio::time::advance(Duration::from_secs(11)).await;

        let expired = take_timed_out(&pending, tokio::time::Instant::now());
        assert_eq!(1, expired.len());
        assert_eq!(
            vec!["r2".to_string()],
            pending.lock().unwrap().keys().cloned().collect::<Vec<_>>()
        );

        notify_timed_out(expired).await;

        let out = rx1.recv().await.unwrap();
        assert_eq!("r1", out.request_id);
        assert_eq!(PeerId::from("p1"), out.peer);
        assert_eq!(PullOutcome::TimedOut, out.outcome);
    }

    #[tokio::test(start_paused = true)]
    async fn notify_ignores_dropped_receivers() {
        let (p1, rx1) = pending_entry(tokio::time::Instant::now());
        drop(rx1);
        notify_timed_out(vec![("r1".into(), p1)]).await;
    }
}
