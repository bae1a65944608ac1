//! Browser bindings
//!
//! The host page owns the canvas and the animation frame; it forwards pointer
//! positions in board units, calls `frame` with the elapsed time, then reads
//! `snapshot_json` and `drain_events_json` to draw.

use std::cell::RefCell;
use std::rc::Rc;

use glam::DVec2;
use wasm_bindgen::prelude::*;

use crate::config::MatchConfig;
use crate::consts::{MAX_SUBSTEPS, SIM_DT};
use crate::session::Session;
use crate::sim::{MatchEngine, MatchEvent, Tier};

/// One match as seen from JS
#[wasm_bindgen]
pub struct ChunMatch {
    engine: MatchEngine,
    accumulator: f64,
    pending: Rc<RefCell<Vec<MatchEvent>>>,
    session: Session,
    recorded: bool,
}

#[wasm_bindgen]
impl ChunMatch {
    /// `config_json` may be empty for the defaults
    #[wasm_bindgen(constructor)]
    pub fn new(tier: u8, config_json: &str) -> Result<ChunMatch, JsError> {
        let tier = Tier::try_from(tier)?;
        let config = if config_json.trim().is_empty() {
            MatchConfig::default()
        } else {
            MatchConfig::from_json(config_json)?
        };
        let seed = js_sys::Date::now() as u64;
        let mut engine = MatchEngine::create_seeded(tier, config, seed)?;

        let pending = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&pending);
        engine.subscribe(move |event| sink.borrow_mut().push(event.clone()));

        Ok(ChunMatch {
            engine,
            accumulator: 0.0,
            pending,
            session: Session::new(),
            recorded: false,
        })
    }

    /// Run fixed steps for `elapsed` seconds of wall time
    pub fn frame(&mut self, elapsed: f64) {
        if !elapsed.is_finite() || elapsed <= 0.0 {
            return;
        }
        self.accumulator += elapsed.min(0.1);

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.engine.tick(SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;
        }

        if !self.recorded && self.session.record_result(self.engine.tier(), self.engine.result()) {
            self.recorded = true;
        }
    }

    pub fn pointer_down(&mut self, x: f64, y: f64) -> bool {
        self.engine.begin_drag(DVec2::new(x, y))
    }

    /// Preview of the pending flick as JSON (`null` when not aiming)
    pub fn pointer_move(&mut self, x: f64, y: f64) -> String {
        let preview = self.engine.drag_preview(DVec2::new(x, y));
        serde_json::to_string(&preview).unwrap_or_else(|_| "null".to_string())
    }

    pub fn pointer_up(&mut self, x: f64, y: f64) -> bool {
        self.engine.release_drag(DVec2::new(x, y)).is_some()
    }

    pub fn pointer_cancel(&mut self) {
        self.engine.cancel_drag();
    }

    pub fn snapshot_json(&self) -> Result<String, JsError> {
        Ok(serde_json::to_string(&self.engine.snapshot())?)
    }

    /// Events since the last call, oldest first
    pub fn drain_events_json(&mut self) -> Result<String, JsError> {
        let events: Vec<MatchEvent> = self.pending.borrow_mut().drain(..).collect();
        Ok(serde_json::to_string(&events)?)
    }

    pub fn session_json(&self) -> Result<String, JsError> {
        Ok(serde_json::to_string(&self.session)?)
    }

    /// Start the next round at the same tier
    pub fn reset(&mut self) {
        self.engine.reset();
        self.accumulator = 0.0;
        self.recorded = false;
        self.pending.borrow_mut().clear();
    }

    pub fn destroy(&mut self) {
        self.engine.destroy();
        self.pending.borrow_mut().clear();
    }
}
