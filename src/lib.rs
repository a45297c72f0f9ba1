#![deny(clippy::unwrap_used)]
//! 井字棋人机对弈核心：极小化极大与 α-β 剪枝两种搜索引擎，以及供前端可视化的搜索树导出，
//! 通过 wasm-bindgen 暴露给浏览器。

pub mod ai;
pub mod game;
pub mod utils;

use gloo_timers::future::TimeoutFuture;
use serde::Serialize;
use serde_wasm_bindgen::{from_value, to_value};
use std::str::FromStr;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::js_sys::Promise;

pub use ai::{
    Algorithm, AlphaBetaEngine, ConfigError, EngineConfig, MinimaxEngine, MoveDecision, NodeId,
    SearchEdge, SearchEngine, SearchNode, SearchTree, MAX_TREE_DEPTH,
};
pub use game::{
    AiStats, Board, BoardError, Cell, GameSession, GameSnapshot, MoveError, Outcome, Player,
};

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    utils::set_panic_hook();
    utils::log(concat!("tictactoe_wasm ", env!("CARGO_PKG_VERSION"), " 已加载"));
}

fn to_js_error<E: Serialize>(error: E) -> JsValue {
    to_value(&error).unwrap_or_else(|serialize_err| JsValue::from_str(&serialize_err.to_string()))
}

fn serde_to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn parse_algorithm(name: Option<&str>, fallback: Algorithm) -> Result<Algorithm, JsValue> {
    match name {
        Some(value) => Algorithm::from_str(value).map_err(to_js_error),
        None => Ok(fallback),
    }
}

/// 解析并校验前端传入的棋盘；核心搜索只接收通过校验的棋盘。
fn board_from_js(board: JsValue) -> Result<Board, JsValue> {
    let board: Board = from_value(board).map_err(JsValue::from)?;
    board.validate().map_err(to_js_error)?;
    Ok(board)
}

fn board_from_json(json: &str) -> Result<Board, JsValue> {
    let board: Board = serde_json::from_str(json).map_err(serde_to_js_error)?;
    board.validate().map_err(to_js_error)?;
    Ok(board)
}

fn snapshot_json(session: &GameSession) -> Result<String, JsValue> {
    serde_json::to_string(&session.snapshot()).map_err(serde_to_js_error)
}

#[derive(Serialize)]
struct AiMoveResponse {
    decision: MoveDecision,
    state: GameSnapshot,
}

#[wasm_bindgen]
pub struct TicTacToeGame {
    session: GameSession,
}

#[wasm_bindgen]
impl TicTacToeGame {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<TicTacToeGame, JsValue> {
        let config = if let Some(json) = config_json {
            let config: EngineConfig = serde_json::from_str(&json).map_err(serde_to_js_error)?;
            config.validate().map_err(to_js_error)?;
            config
        } else {
            EngineConfig::default()
        };
        Ok(TicTacToeGame {
            session: GameSession::new(config),
        })
    }

    pub fn state_json(&self) -> Result<String, JsValue> {
        snapshot_json(&self.session)
    }

    pub fn set_algorithm(&mut self, algorithm: &str) -> Result<(), JsValue> {
        let algorithm = Algorithm::from_str(algorithm).map_err(to_js_error)?;
        self.session.set_algorithm(algorithm);
        Ok(())
    }

    /// 从 JSON 棋盘恢复局面，例如刷新页面后继续对局。
    pub fn set_board_json(&mut self, json: &str) -> Result<String, JsValue> {
        let board: Board = serde_json::from_str(json).map_err(serde_to_js_error)?;
        self.session.load_board(board).map_err(to_js_error)?;
        snapshot_json(&self.session)
    }

    /// 人类在 `position` 落子，电脑随即应手，返回新的对局状态。
    pub fn make_move_json(
        &mut self,
        position: u32,
        algorithm: Option<String>,
    ) -> Result<String, JsValue> {
        let algorithm = parse_algorithm(algorithm.as_deref(), self.session.algorithm())?;
        self.session.set_algorithm(algorithm);
        let snapshot = self.session.play_turn(position as usize).map_err(|error| {
            utils::warn(&format!("落子被拒绝：{error}"));
            to_js_error(error)
        })?;
        serde_json::to_string(&snapshot).map_err(serde_to_js_error)
    }

    pub fn ai_move_json(&mut self) -> Result<String, JsValue> {
        let decision = self.session.ai_move().map_err(to_js_error)?;
        let response = AiMoveResponse {
            decision,
            state: self.session.snapshot(),
        };
        serde_json::to_string(&response).map_err(serde_to_js_error)
    }

    /// 导出搜索树。`board_json` 缺省时使用当前棋盘，`algorithm` 缺省时使用当前算法。
    pub fn tree_json(
        &mut self,
        board_json: Option<String>,
        algorithm: Option<String>,
    ) -> Result<String, JsValue> {
        let algorithm = parse_algorithm(algorithm.as_deref(), self.session.algorithm())?;
        self.session.set_algorithm(algorithm);
        let board = match board_json {
            Some(json) => Some(board_from_json(&json)?),
            None => None,
        };
        let tree = self.session.tree(board.as_ref());
        serde_json::to_string(&tree).map_err(serde_to_js_error)
    }

    pub fn reset(&mut self) -> Result<String, JsValue> {
        self.session.reset();
        snapshot_json(&self.session)
    }

    /// 在等待 `delay_ms`（缺省取配置）后计算电脑的建议着法，不修改当前对局。
    pub fn think_ai(&self, delay_ms: Option<u32>) -> Promise {
        let board = *self.session.board();
        let algorithm = self.session.algorithm();
        let delay = delay_ms.unwrap_or(self.session.config().think_delay_ms);

        future_to_promise(async move {
            if delay > 0 {
                TimeoutFuture::new(delay).await;
            }
            let decision = algorithm.engine().best_move(&board);
            let json = serde_json::to_string(&decision).map_err(serde_to_js_error)?;
            Ok(JsValue::from_str(&json))
        })
    }
}

#[wasm_bindgen(js_name = "bestMove")]
pub fn best_move(board: JsValue, algorithm: Option<String>) -> Result<JsValue, JsValue> {
    let board = board_from_js(board)?;
    let algorithm = parse_algorithm(algorithm.as_deref(), Algorithm::default())?;
    let decision = algorithm.engine().best_move(&board);
    to_value(&decision).map_err(JsValue::from)
}

/// 导出按深度截断的搜索树，深度上限为 [`MAX_TREE_DEPTH`]。
#[wasm_bindgen(js_name = "exportTree")]
pub fn export_tree(
    board: JsValue,
    algorithm: Option<String>,
    max_depth: Option<u32>,
) -> Result<JsValue, JsValue> {
    let board = board_from_js(board)?;
    let algorithm = parse_algorithm(algorithm.as_deref(), Algorithm::default())?;
    let config = EngineConfig::default()
        .with_tree_depth(max_depth.unwrap_or(ai::DEFAULT_TREE_DEPTH))
        .map_err(to_js_error)?;
    let tree = algorithm.engine().export_tree(&board, config.tree_depth);
    to_value(&tree).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "isWinner")]
pub fn is_winner(board: JsValue, player: &str) -> Result<bool, JsValue> {
    let board: Board = from_value(board).map_err(JsValue::from)?;
    let player = Player::from_str(player).map_err(to_js_error)?;
    Ok(ai::is_winner(&board, player))
}

#[wasm_bindgen(js_name = "validateBoard")]
pub fn validate_board(board: JsValue) -> Result<(), JsValue> {
    board_from_js(board).map(|_| ())
}
