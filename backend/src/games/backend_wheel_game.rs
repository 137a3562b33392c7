use std::sync::Arc;
use std::time::Duration;

use axum::{
    debug_handler,
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use futures::{sink::SinkExt, stream::StreamExt};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;
use tokio::sync::{broadcast, Mutex};
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use validator::Validate;
use wheel_shared::angle_strategy::{AngleStrategy, PayoutAngle, UniformAngle, WeightedAngle};
use wheel_shared::shared_wheel_game::*;
use wheel_shared::{RunningTotals, SegmentTable, WheelError};

use crate::config::{AngleMode, AppConfig};
use crate::error::Error;

// Frames a slow WebSocket subscriber may fall behind before it starts losing ticks
const TICK_CHANNEL_CAPACITY: usize = 512;

#[derive(Clone)]
pub struct WheelState {
    pub game: Arc<Mutex<WheelGame>>,
    pub ticks: broadcast::Sender<WheelMessage>,
    pub config: Arc<AppConfig>,
}

impl WheelState {
    pub fn new(config: AppConfig) -> Self {
        let (ticks, _) = broadcast::channel(TICK_CHANNEL_CAPACITY);
        Self {
            game: Arc::new(Mutex::new(WheelGame::new(config.layout.table().clone()))),
            ticks,
            config: Arc::new(config),
        }
    }

    fn publish(&self, message: WheelMessage) {
        // Nobody listening is not an error
        let _ = self.ticks.send(message);
    }
}

pub fn create_wheel_game_router() -> Router<WheelState> {
    Router::new()
        .route("/table", get(get_table).put(configure_table))
        .route("/prediction", post(set_prediction))
        .route("/spin", post(spin_wheel))
        .route("/cancel", post(cancel_spin))
        .route("/state", get(get_state))
        .route("/totals", get(get_totals))
        .route("/reset", post(reset_totals))
        .route("/ws", get(ws_handler))
}

async fn get_table(State(state): State<WheelState>) -> Result<Json<TableResponse>, Error> {
    let game = state.game.lock().await;
    Ok(Json(TableResponse::from(game.table()?)))
}

async fn configure_table(
    State(state): State<WheelState>,
    Json(request): Json<ConfigureRequest>,
) -> Result<Json<TableResponse>, Error> {
    let table = request.into_table()?;
    let mut game = state.game.lock().await;
    game.configure(table)?;
    let table = game.table()?;
    info!("🎡 Wheel reconfigured with {} segments", table.segment_count());
    Ok(Json(TableResponse::from(table)))
}

async fn set_prediction(
    State(state): State<WheelState>,
    Json(request): Json<PredictionRequest>,
) -> Result<Json<PublicWheelGame>, Error> {
    let mut game = state.game.lock().await;
    // The spin in flight resolves against the prediction it started with
    if game.is_spinning() {
        return Err(WheelError::AlreadySpinning.into());
    }
    game.set_prediction(request.prediction);
    Ok(Json(game.to_public()))
}

fn pick_strategy(
    config: &AppConfig,
    target_payout: Option<i64>,
    table: &SegmentTable,
) -> Result<Box<dyn AngleStrategy + Send>, Error> {
    if let Some(payout) = target_payout {
        return Ok(Box::new(PayoutAngle(payout)));
    }
    let rng = StdRng::from_entropy();
    let strategy: Box<dyn AngleStrategy + Send> = match config.angle_mode {
        AngleMode::Uniform => Box::new(UniformAngle::new(rng)),
        AngleMode::Weighted => Box::new(WeightedAngle::by_rarity(table, rng)?),
    };
    Ok(strategy)
}

#[debug_handler]
async fn spin_wheel(
    State(state): State<WheelState>,
    Json(request): Json<WheelSpinRequest>,
) -> Result<Json<WheelSpinResponse>, Error> {
    request.validate()?;
    let rotation_count = request.rotation_count.unwrap_or(state.config.rotation_count);
    let duration = request
        .duration_ms
        .map(Duration::from_millis)
        .unwrap_or(state.config.spin_duration);

    let (spin_id, plan, jackpot) = {
        let mut game = state.game.lock().await;
        let table = game.table()?;
        let jackpot = table.jackpot_payout();
        let mut strategy = pick_strategy(&state.config, request.target_payout, table)?;
        let plan = game.plan_spin(strategy.as_mut(), rotation_count, duration, state.config.easing)?;
        let spin_id = game.begin_spin(plan)?;
        (spin_id, plan, jackpot)
    };

    info!(
        "🎡 Spin {} started: {} rotations to {} degrees over {:?}",
        spin_id, plan.rotation_count, plan.target_stop_angle, plan.duration
    );
    state.publish(WheelMessage::SpinStarted {
        spin_id,
        target_stop_angle: plan.target_stop_angle,
        rotation_count: plan.rotation_count,
        duration_ms: plan.duration.as_millis() as u64,
    });

    // Runs on its own task so a dropped request cannot strand the wheel mid-spin
    let driver = tokio::spawn(drive_spin(state.clone(), spin_id));
    let outcome = driver.await.map_err(|_| Error::SpinTask)??;

    info!(
        "🎡 Spin {} paid {} (base {}, predicted: {})",
        spin_id, outcome.result.awarded_payout, outcome.result.base_payout, outcome.result.predicted_correctly
    );
    Ok(Json(WheelSpinResponse::from_outcome(&outcome, jackpot)))
}

/// Samples the spin once per frame until it settles or is aborted.
async fn drive_spin(state: WheelState, spin_id: SpinId) -> Result<SpinOutcome, WheelError> {
    let started = Instant::now();
    let mut frames = interval(state.config.frame_interval);
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        frames.tick().await;
        let mut game = state.game.lock().await;
        let sample = game.sample(spin_id, started.elapsed())?;

        if let Some(index) = sample.crossed {
            debug!("🔔 Spin {} crossed segment {}", spin_id, index);
            state.publish(WheelMessage::SegmentCrossed { spin_id, index });
        }

        if sample.settled.is_some() {
            let outcome = game.settle(spin_id)?;
            let jackpot = game.table()?.jackpot_payout();
            drop(game);

            state.publish(WheelMessage::SpinSettled {
                spin_id,
                result: outcome.result,
                message: outcome_message(&outcome.result, jackpot),
            });
            return Ok(outcome);
        }
    }
}

async fn cancel_spin(State(state): State<WheelState>) -> Result<Json<serde_json::Value>, Error> {
    let cancelled = state.game.lock().await.cancel_spin();
    match cancelled {
        Some(spin_id) => {
            warn!("🎡 Spin {} cancelled", spin_id);
            state.publish(WheelMessage::SpinAborted { spin_id });
            Ok(Json(json!({ "cancelled": true, "spin_id": spin_id })))
        }
        None => Err(WheelError::NotSpinning.into()),
    }
}

async fn get_state(State(state): State<WheelState>) -> Json<PublicWheelGame> {
    Json(state.game.lock().await.to_public())
}

async fn get_totals(State(state): State<WheelState>) -> Json<RunningTotals> {
    Json(state.game.lock().await.totals())
}

async fn reset_totals(State(state): State<WheelState>) -> Json<RunningTotals> {
    let totals = {
        let mut game = state.game.lock().await;
        game.reset_totals();
        game.totals()
    };
    info!("🎡 Running totals reset");
    state.publish(WheelMessage::TotalsReset);
    Json(totals)
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<WheelState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: WheelState) {
    let (mut sender, mut receiver) = socket.split();
    let mut ticks = state.ticks.subscribe();
    info!("Wheel subscriber connected");

    let mut send_task = tokio::spawn(async move {
        loop {
            match ticks.recv().await {
                Ok(message) => {
                    let Ok(text) = serde_json::to_string(&message) else {
                        continue;
                    };
                    if sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Wheel subscriber fell behind, dropped {} frames", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    // Only watch for the client going away
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = receiver.next().await {
            if let Message::Close(_) = message {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
    info!("Wheel subscriber disconnected");
}
