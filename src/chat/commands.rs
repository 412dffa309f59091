//! Inbound chat commands.
//!
//! [`run_inbound`] long-polls the transport and spawns one task per
//! message, so a slow store write for one user never delays another. The
//! handler reads the latest snapshot from a `watch` channel published by
//! the poll loop; it never touches the poll loop's own state.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::{ChatTransport, InboundMessage};
use crate::domain::Snapshot;
use crate::error::NotifierError;
use crate::service::render;
use crate::store::{AlertRepository, SubscriberRepository};

/// Pause after a failed long poll before trying again.
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

const NOT_SUBSCRIBED: &str = "You are not subscribed yet. Send /start to begin.";
const NO_DATA_YET: &str = "No feed data yet. Please try again in a few minutes.";
const GENERIC_FAILURE: &str =
    "Something went wrong while handling your command. Please try again later.";

/// Latest published snapshot; `None` until the first cycle completes.
pub type SnapshotReceiver = watch::Receiver<Option<Arc<Snapshot>>>;

/// A recognized chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Register or re-enable notifications.
    Start,
    /// Disable notifications.
    Stop,
    /// Add a reward filter.
    AddFilter(Option<String>),
    /// Remove a reward filter.
    RemoveFilter(Option<String>),
    /// List reward filters.
    Filters,
    /// Show subscriber settings.
    Settings,
    /// Show the command list.
    Help,
    /// Mark a legacy alert completed.
    Done(Option<String>),
    /// List completed legacy alerts.
    Completed,
    /// Active legacy alerts.
    Alerts,
    /// Active events.
    Events,
    /// Active invasions.
    Invasions,
    /// Nightwave challenges.
    Nightwave,
    /// Void trader status.
    Trader,
    /// Boss rotation.
    Archon,
    /// Region cycles.
    Cycles,
}

impl Command {
    /// Parses a message. Returns `None` for text that is not a known
    /// command.
    ///
    /// The command word is case-insensitive and may carry an `@botname`
    /// suffix; the remainder of the message is the argument.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let (word, rest) = text.split_once(char::is_whitespace).unwrap_or((text, ""));
        let word = word.split_once('@').map_or(word, |(w, _)| w).to_lowercase();
        let argument = Some(rest.trim())
            .filter(|a| !a.is_empty())
            .map(str::to_string);

        let command = match word.as_str() {
            "/start" => Self::Start,
            "/stop" => Self::Stop,
            "/addfilter" => Self::AddFilter(argument),
            "/removefilter" => Self::RemoveFilter(argument),
            "/filters" => Self::Filters,
            "/settings" => Self::Settings,
            "/help" => Self::Help,
            "/done" => Self::Done(argument),
            "/completed" => Self::Completed,
            "/alerts" => Self::Alerts,
            "/events" => Self::Events,
            "/invasions" => Self::Invasions,
            "/nightwave" => Self::Nightwave,
            "/trader" => Self::Trader,
            "/archon" => Self::Archon,
            "/cycles" => Self::Cycles,
            _ => return None,
        };
        Some(command)
    }
}

/// Answers inbound commands.
#[derive(Debug)]
pub struct CommandHandler<C> {
    chat: Arc<C>,
    subscribers: SubscriberRepository,
    alerts: AlertRepository,
    latest: SnapshotReceiver,
}

impl<C: ChatTransport> CommandHandler<C> {
    /// Creates a handler.
    #[must_use]
    pub fn new(
        chat: Arc<C>,
        subscribers: SubscriberRepository,
        alerts: AlertRepository,
        latest: SnapshotReceiver,
    ) -> Self {
        Self {
            chat,
            subscribers,
            alerts,
            latest,
        }
    }

    /// Handles one message and sends the reply, if any.
    ///
    /// # Errors
    ///
    /// Returns store errors other than an unknown subscriber, and the
    /// transport error if the reply cannot be sent.
    pub async fn handle(&self, message: &InboundMessage) -> Result<(), NotifierError> {
        let Some(command) = Command::parse(&message.text) else {
            tracing::trace!(user_id = message.user_id, "ignoring non-command message");
            return Ok(());
        };
        tracing::info!(
            user_id = message.user_id,
            update_id = message.update_id,
            command = ?command,
            "handling command"
        );
        let reply = self.reply(command, message).await?;
        self.chat.send_message(&message.chat_id, &reply).await
    }

    /// Like [`Self::handle`], but logs failures and answers them with a
    /// generic reply.
    pub async fn respond(&self, message: &InboundMessage) {
        let Err(e) = self.handle(message).await else {
            return;
        };
        if e.is_transport() {
            tracing::warn!(user_id = message.user_id, update_id = message.update_id, error = %e, "command reply failed");
        } else {
            tracing::error!(user_id = message.user_id, update_id = message.update_id, error = %e, "command failed");
        }
        if let Err(e) = self.chat.send_message(&message.chat_id, GENERIC_FAILURE).await {
            tracing::warn!(user_id = message.user_id, error = %e, "failed to send error reply");
        }
    }

    async fn reply(&self, command: Command, message: &InboundMessage) -> Result<String, NotifierError> {
        let user_id = message.user_id;
        match command {
            Command::Start => {
                self.subscribers.register(user_id, &message.chat_id).await?;
                Ok("Hi! I will notify you about new events, invasions and more.\n\
                    Send /help to see what I can do."
                    .to_string())
            }
            Command::Stop => or_not_subscribed(
                self.subscribers
                    .set_enabled(user_id, false)
                    .await
                    .map(|()| "Notifications disabled. Send /start to enable them again.".to_string()),
            ),
            Command::AddFilter(None) => {
                Ok("Please name a reward, for example: /addfilter Nitain".to_string())
            }
            Command::AddFilter(Some(filter)) => or_not_subscribed(
                self.subscribers
                    .add_filter(user_id, &filter)
                    .await
                    .map(|added| {
                        if added {
                            format!("Filter '{filter}' added.")
                        } else {
                            format!("Filter '{filter}' is already set.")
                        }
                    }),
            ),
            Command::RemoveFilter(None) => {
                Ok("Please name the filter to remove, for example: /removefilter Nitain".to_string())
            }
            Command::RemoveFilter(Some(filter)) => or_not_subscribed(
                self.subscribers
                    .remove_filter(user_id, &filter)
                    .await
                    .map(|removed| {
                        if removed {
                            format!("Filter '{filter}' removed.")
                        } else {
                            format!("You have no filter '{filter}'.")
                        }
                    }),
            ),
            Command::Filters => Ok(self
                .subscribers
                .get(user_id)
                .await?
                .map_or_else(|| NOT_SUBSCRIBED.to_string(), |s| render::filters(&s))),
            Command::Settings => Ok(self
                .subscribers
                .get(user_id)
                .await?
                .map_or_else(|| NOT_SUBSCRIBED.to_string(), |s| render::settings(&s))),
            Command::Help => Ok(render::help().to_string()),
            Command::Done(None) => Ok("Please give the alert id, for example: /done 5f1e...".to_string()),
            Command::Done(Some(alert_id)) => {
                match self.alerts.mark_completed_once(&alert_id, user_id).await {
                    Ok(true) => Ok(format!("Alert {alert_id} marked completed.")),
                    Ok(false) => Ok(format!("Alert {alert_id} is already marked completed.")),
                    Err(NotifierError::InvalidRequest(reason)) => {
                        Ok(format!("Cannot mark that alert: {reason}."))
                    }
                    Err(e) => Err(e),
                }
            }
            Command::Completed => Ok(render::completed_view(
                &self.alerts.completed_alerts(user_id).await?,
            )),
            Command::Alerts => Ok(render::alerts_view(
                &self.alerts.active_alerts(Utc::now()).await?,
            )),
            Command::Events => Ok(self.view(render::events_view)),
            Command::Invasions => Ok(self.view(render::invasions_view)),
            Command::Nightwave => Ok(self.view(render::nightwave_view)),
            Command::Trader => Ok(self.view(render::trader_view)),
            Command::Archon => Ok(self.view(render::boss_rotation_view)),
            Command::Cycles => Ok(self.view(|s| render::cycles_view(s, Utc::now()))),
        }
    }

    fn view(&self, build: impl FnOnce(&Snapshot) -> String) -> String {
        let latest = self.latest.borrow().clone();
        latest.map_or_else(|| NO_DATA_YET.to_string(), |snapshot| build(&snapshot))
    }
}

fn or_not_subscribed(result: Result<String, NotifierError>) -> Result<String, NotifierError> {
    match result {
        Err(NotifierError::SubscriberNotFound(_)) => Ok(NOT_SUBSCRIBED.to_string()),
        other => other,
    }
}

/// Long-polls `chat` for updates until `shutdown` fires, handling each
/// message on its own task.
pub async fn run_inbound<C>(
    handler: Arc<CommandHandler<C>>,
    poll_timeout: Duration,
    shutdown: CancellationToken,
) where
    C: ChatTransport + 'static,
{
    let mut offset = 0_i64;
    tracing::info!("inbound command loop started");

    loop {
        let polled = tokio::select! {
            () = shutdown.cancelled() => break,
            polled = handler.chat.next_updates(offset, poll_timeout) => polled,
        };

        match polled {
            Ok(batch) => {
                offset = batch.next_offset(offset);
                for message in batch.messages {
                    let handler = Arc::clone(&handler);
                    tokio::spawn(async move {
                        handler.respond(&message).await;
                    });
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "polling for chat updates failed");
                tokio::select! {
                    () = shutdown.cancelled() => break,
                    () = tokio::time::sleep(POLL_RETRY_DELAY) => {}
                }
            }
        }
    }

    tracing::info!("inbound command loop stopped");
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::chat::UpdateBatch;
    use crate::domain::{FactId, LegacyAlert, TimedFact};
    use crate::store::DocumentStore;

    #[derive(Debug, Default)]
    struct RecordingChat {
        sent: Mutex<Vec<(String, String)>>,
    }

    impl RecordingChat {
        fn replies(&self) -> Vec<String> {
            self.sent
                .lock()
                .map(|sent| sent.iter().map(|(_, text)| text.clone()).collect())
                .unwrap_or_default()
        }

        fn last_reply(&self) -> String {
            self.replies().pop().unwrap_or_default()
        }
    }

    impl ChatTransport for RecordingChat {
        async fn send_message(&self, destination: &str, text: &str) -> Result<(), NotifierError> {
            if let Ok(mut sent) = self.sent.lock() {
                sent.push((destination.to_string(), text.to_string()));
            }
            Ok(())
        }

        async fn next_updates(&self, _offset: i64, _timeout: Duration) -> Result<UpdateBatch, NotifierError> {
            Ok(UpdateBatch::default())
        }
    }

    struct Fixture {
        dir: tempfile::TempDir,
        chat: Arc<RecordingChat>,
        handler: CommandHandler<RecordingChat>,
        subscribers: SubscriberRepository,
        alerts: AlertRepository,
        publish: watch::Sender<Option<Arc<Snapshot>>>,
    }

    async fn fixture() -> Fixture {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let Ok(store) = DocumentStore::open(dir.path()).await else {
            panic!("store should open");
        };
        let store = Arc::new(store);
        let chat = Arc::new(RecordingChat::default());
        let subscribers = SubscriberRepository::new(Arc::clone(&store));
        let alerts = AlertRepository::new(Arc::clone(&store));
        let (publish, latest) = watch::channel(None);
        let handler = CommandHandler::new(
            Arc::clone(&chat),
            subscribers.clone(),
            alerts.clone(),
            latest,
        );
        Fixture {
            dir,
            chat,
            handler,
            subscribers,
            alerts,
            publish,
        }
    }

    fn message(text: &str) -> InboundMessage {
        InboundMessage {
            update_id: 1,
            user_id: 42,
            chat_id: "4200".to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn parse_recognizes_commands_and_arguments() {
        assert_eq!(Command::parse("/start"), Some(Command::Start));
        assert_eq!(Command::parse("  /HELP  "), Some(Command::Help));
        assert_eq!(Command::parse("/cycles@notifier_bot"), Some(Command::Cycles));
        assert_eq!(
            Command::parse("/addfilter  Orokin Catalyst "),
            Some(Command::AddFilter(Some("Orokin Catalyst".to_string())))
        );
        assert_eq!(Command::parse("/addfilter"), Some(Command::AddFilter(None)));
        assert_eq!(Command::parse("/done"), Some(Command::Done(None)));
        assert_eq!(Command::parse("hello there"), None);
        assert_eq!(Command::parse("/unknown"), None);
        assert_eq!(Command::parse(""), None);
    }

    #[tokio::test]
    async fn start_registers_and_replies() {
        let f = fixture().await;
        assert!(f.handler.handle(&message("/start")).await.is_ok());

        let Ok(Some(subscriber)) = f.subscribers.get(42).await else {
            panic!("subscriber should exist");
        };
        assert_eq!(subscriber.destination, "4200");
        assert!(subscriber.notifications_enabled);
        assert!(f.chat.last_reply().starts_with("Hi!"));
    }

    #[tokio::test]
    async fn filter_commands_require_subscription() {
        let f = fixture().await;
        assert!(f.handler.handle(&message("/addfilter Nitain")).await.is_ok());
        assert_eq!(f.chat.last_reply(), NOT_SUBSCRIBED);
        assert!(f.handler.handle(&message("/stop")).await.is_ok());
        assert_eq!(f.chat.last_reply(), NOT_SUBSCRIBED);
    }

    #[tokio::test]
    async fn filters_round_trip_through_commands() {
        let f = fixture().await;
        let _ = f.handler.handle(&message("/start")).await;
        let _ = f.handler.handle(&message("/addfilter Nitain")).await;
        assert_eq!(f.chat.last_reply(), "Filter 'Nitain' added.");
        let _ = f.handler.handle(&message("/addfilter nitain")).await;
        assert_eq!(f.chat.last_reply(), "Filter 'nitain' is already set.");
        let _ = f.handler.handle(&message("/filters")).await;
        assert_eq!(f.chat.last_reply(), "Your filters:\n• Nitain");
        let _ = f.handler.handle(&message("/removefilter NITAIN")).await;
        assert_eq!(f.chat.last_reply(), "Filter 'NITAIN' removed.");
        let _ = f.handler.handle(&message("/addfilter")).await;
        assert!(f.chat.last_reply().starts_with("Please name a reward"));
    }

    #[tokio::test]
    async fn stop_disables_notifications() {
        let f = fixture().await;
        let _ = f.handler.handle(&message("/start")).await;
        let _ = f.handler.handle(&message("/stop")).await;
        let Ok(Some(subscriber)) = f.subscribers.get(42).await else {
            panic!("subscriber should exist");
        };
        assert!(!subscriber.notifications_enabled);
    }

    #[tokio::test]
    async fn views_wait_for_first_snapshot() {
        let f = fixture().await;
        let _ = f.handler.handle(&message("/events")).await;
        assert_eq!(f.chat.last_reply(), NO_DATA_YET);

        let snapshot = Snapshot {
            events: vec![TimedFact {
                id: FactId::from("ev"),
                description: "Thermia Fractures".to_string(),
                faction: "Corpus".to_string(),
                location: "Orb Vallis".to_string(),
                expiry: None,
                active: true,
                reward: "Opticor Vandal".to_string(),
            }],
            ..Snapshot::default()
        };
        let _ = f.publish.send(Some(Arc::new(snapshot)));
        let _ = f.handler.handle(&message("/events")).await;
        assert!(f.chat.last_reply().contains("Opticor Vandal"));
    }

    #[tokio::test]
    async fn done_marks_alert_once() {
        let f = fixture().await;
        let now = Utc::now();
        let alert = LegacyAlert {
            id: "a1".to_string(),
            mission: "Survival".to_string(),
            mission_type: "Survival".to_string(),
            reward: "Forma".to_string(),
            location: "Mot (Void)".to_string(),
            enemy: "Corrupted".to_string(),
            min_enemy_level: 30,
            max_enemy_level: 40,
            start: now,
            end: now + chrono::Duration::hours(1),
            active: true,
        };
        assert!(f.alerts.save_alerts(&[alert]).await.is_ok());

        let _ = f.handler.handle(&message("/alerts")).await;
        assert!(f.chat.last_reply().contains("🆔 a1"));
        let _ = f.handler.handle(&message("/done a1")).await;
        assert_eq!(f.chat.last_reply(), "Alert a1 marked completed.");
        let _ = f.handler.handle(&message("/done a1")).await;
        assert_eq!(f.chat.last_reply(), "Alert a1 is already marked completed.");
        let _ = f.handler.handle(&message("/completed")).await;
        assert!(f.chat.last_reply().contains("Mot (Void)"));
    }

    #[tokio::test]
    async fn done_rejects_malformed_id_and_dedupes_concurrent_requests() {
        let f = fixture().await;
        let _ = f.handler.handle(&message("/done a1 a2")).await;
        assert!(f.chat.last_reply().starts_with("Cannot mark that alert"));

        let (msg_a, msg_b) = (message("/done b7"), message("/done b7"));
        let (first, second) = tokio::join!(f.handler.handle(&msg_a), f.handler.handle(&msg_b));
        assert!(first.is_ok() && second.is_ok());
        let replies = f.chat.replies();
        assert_eq!(
            replies.iter().filter(|r| *r == "Alert b7 marked completed.").count(),
            1
        );
        assert_eq!(
            replies
                .iter()
                .filter(|r| *r == "Alert b7 is already marked completed.")
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn store_failure_gets_generic_reply() {
        let f = fixture().await;
        let users = f.dir.path().join("users.json");
        assert!(std::fs::write(users, "{ broken").is_ok());

        assert!(f.handler.handle(&message("/settings")).await.is_err());
        f.handler.respond(&message("/settings")).await;
        assert_eq!(f.chat.last_reply(), GENERIC_FAILURE);
    }

    #[tokio::test]
    async fn plain_text_is_ignored() {
        let f = fixture().await;
        assert!(f.handler.handle(&message("good morning")).await.is_ok());
        assert!(f.chat.replies().is_empty());
    }

    #[tokio::test]
    async fn inbound_loop_stops_on_shutdown() {
        let f = fixture().await;
        let shutdown = CancellationToken::new();
        shutdown.cancel();
        let handler = Arc::new(f.handler);
        tokio::time::timeout(
            Duration::from_secs(1),
            run_inbound(handler, Duration::from_secs(1), shutdown),
        )
        .await
        .unwrap_or_else(|_| panic!("loop should stop"));
    }
}
