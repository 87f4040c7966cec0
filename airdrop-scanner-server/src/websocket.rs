use std::sync::Arc;

use actix::{Actor, ActorContext, ActorFutureExt, AsyncContext, SpawnHandle, StreamHandler};
use actix_web::{web, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use airdrop_scanner_logic::{
    normalize_wallets, ScanOptions, ScanTotals, WalletChecker, WalletSummary,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{settings::RealtimeSettings, AppState};

pub async fn ws_entry(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
) -> Result<HttpResponse, actix_web::Error> {
    ws::start(
        ScanSocket::new(Arc::clone(&state.checker), state.realtime),
        &req,
        stream,
    )
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    #[serde(rename_all = "camelCase")]
    SubscribeScan {
        #[serde(default)]
        wallets: Vec<String>,
        interval_ms: Option<u64>,
        include_transfers: Option<bool>,
    },
    Unsubscribe,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerMessage {
    Ready,
    #[serde(rename_all = "camelCase")]
    Subscribed {
        wallets: Vec<String>,
        interval_ms: u64,
        include_transfers: bool,
    },
    Unsubscribed,
    #[serde(rename_all = "camelCase")]
    ScanResult {
        generated_at: DateTime<Utc>,
        wallets: Vec<WalletSummary>,
        totals: ScanTotals,
    },
    Error {
        error: String,
    },
}

/// One websocket session holding at most one periodic scan subscription.
///
/// Re-subscribing replaces the previous subscription; the generation
/// counter makes sure a scan pass started under an old subscription never
/// emits after the replacement.
pub struct ScanSocket {
    checker: Arc<WalletChecker>,
    realtime: RealtimeSettings,
    wallets: Vec<String>,
    include_transfers: bool,
    timer: Option<SpawnHandle>,
    generation: u64,
}

impl ScanSocket {
    pub fn new(checker: Arc<WalletChecker>, realtime: RealtimeSettings) -> Self {
        Self {
            checker,
            realtime,
            wallets: Vec::new(),
            include_transfers: true,
            timer: None,
            generation: 0,
        }
    }

    fn send(&self, ctx: &mut ws::WebsocketContext<Self>, message: &ServerMessage) {
        let payload = serde_json::to_string(message).unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to serialize websocket message");
            String::from("{\"type\":\"error\",\"error\":\"internal serialization error\"}")
        });
        ctx.text(payload);
    }

    fn subscribe(
        &mut self,
        ctx: &mut ws::WebsocketContext<Self>,
        wallets: Vec<String>,
        interval_ms: Option<u64>,
        include_transfers: Option<bool>,
    ) {
        let wallets = normalize_wallets(wallets);
        if wallets.is_empty() {
            self.send(
                ctx,
                &ServerMessage::Error {
                    error: "No valid wallets supplied".to_string(),
                },
            );
            return;
        }

        self.drop_subscription(ctx);
        let interval = self.realtime.effective_interval(interval_ms);
        self.wallets = wallets.clone();
        self.include_transfers = include_transfers.unwrap_or(true);

        self.send(
            ctx,
            &ServerMessage::Subscribed {
                wallets,
                interval_ms: interval.as_millis() as u64,
                include_transfers: self.include_transfers,
            },
        );

        // first pass fires immediately, then on the interval
        self.run_pass(ctx);
        self.timer = Some(ctx.run_interval(interval, |actor, ctx| actor.run_pass(ctx)));
    }

    fn unsubscribe(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        self.drop_subscription(ctx);
        self.send(ctx, &ServerMessage::Unsubscribed);
    }

    /// Cancels the timer and bumps the generation so that in-flight passes
    /// become no-ops.
    fn drop_subscription(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        self.generation += 1;
        if let Some(timer) = self.timer.take() {
            ctx.cancel_future(timer);
        }
        self.wallets.clear();
    }

    fn run_pass(&self, ctx: &mut ws::WebsocketContext<Self>) {
        let generation = self.generation;
        let checker = Arc::clone(&self.checker);
        let wallets = self.wallets.clone();
        let options = ScanOptions {
            include_transfers: self.include_transfers,
        };

        // wallets are scanned one after another; the per-airdrop fan-out
        // inside the checker is the concurrency knob
        let scan = async move {
            let mut summaries = Vec::with_capacity(wallets.len());
            for wallet in &wallets {
                summaries.push(checker.check_wallet(wallet, options).await);
            }
            summaries
        };

        ctx.spawn(actix::fut::wrap_future(scan).map(
            move |summaries: Vec<WalletSummary>, actor: &mut Self, ctx| {
                if actor.generation != generation {
                    return;
                }
                let totals = ScanTotals::aggregate(&summaries);
                actor.send(
                    ctx,
                    &ServerMessage::ScanResult {
                        generated_at: Utc::now(),
                        wallets: summaries,
                        totals,
                    },
                );
            },
        ));
    }
}

impl Actor for ScanSocket {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::debug!("websocket session opened");
        self.send(ctx, &ServerMessage::Ready);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::debug!("websocket session closed");
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for ScanSocket {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(payload)) => ctx.pong(&payload),
            Ok(ws::Message::Text(text)) => match serde_json::from_str(&text) {
                Ok(ClientMessage::SubscribeScan {
                    wallets,
                    interval_ms,
                    include_transfers,
                }) => self.subscribe(ctx, wallets, interval_ms, include_transfers),
                Ok(ClientMessage::Unsubscribe) => self.unsubscribe(ctx),
                Err(e) => {
                    tracing::debug!(error = %e, "unparseable websocket message");
                    self.send(
                        ctx,
                        &ServerMessage::Error {
                            error: "Invalid message".to_string(),
                        },
                    );
                }
            },
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            _ => (),
        }
    }
}
