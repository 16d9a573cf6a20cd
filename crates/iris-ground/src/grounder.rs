// Copyright (c) 2025-2026 Iris Contributors
//
// SPDX-License-Identifier: Apache-2.0
use std::sync::Arc;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, warn};

use iris_actions::AgentAction;
use iris_agents::{CodeAgent, CodeReport};
use iris_config::AgentConfig;
use iris_input::Primitive;
use iris_model::{
    ChatMessage, ContentPart, GenOptions, GroundingServerClient, LlmClient,
};
use iris_screen::{render_ocr_table, Observation, TextLocator, OCR_EDGE_KEEP};

use crate::platform::PlatformStrategy;
use crate::spreadsheet::SpreadsheetDriver;
use crate::GroundError;

/// Seconds a compiled drag takes from start to end.
const DRAG_DURATION_SECS: f64 = 0.8;

const GROUND_PROMPT: &str = "Locate this element in the screenshot and reply with its \
    coordinates as two integers `x y` in the image frame, nothing else.\nElement: {description}";

const LOCATOR_PROMPT: &str = "Below is a table of words recognised on screen, one `id<TAB>text` \
    row per word, in reading order.  Reply with the id of the word that {alignment} the phrase; \
    the last integer in your reply is taken as the id.\nPhrase: {phrase}\n\n{table}";

/// How the grounding model is reached.
pub enum GroundRoute {
    /// Any chat provider (vision model behind the normal completion API).
    Chat(LlmClient),
    /// The auxiliary server's dedicated `/grounding/generate` route.
    Server(GroundingServerClient),
}

/// Where on the located word a text-anchored point lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Start,
    End,
    Center,
}

impl Alignment {
    fn describe(&self) -> &'static str {
        match self {
            Alignment::Start => "starts",
            Alignment::End => "ends",
            Alignment::Center => "contains the middle of",
        }
    }
}

/// Result of compiling one action.
#[derive(Debug)]
pub enum CompiledStep {
    /// Input primitives, in execution order.
    Primitives(Vec<Primitive>),
    /// Terminal sentinel: the task succeeded.
    Done,
    /// Terminal sentinel: the model declared failure.
    Fail,
    /// The action had only internal effects (notes, code agent, cells).
    NoOp,
}

pub struct Grounder {
    route: GroundRoute,
    locator: LlmClient,
    ocr: Arc<dyn TextLocator>,
    platform: Arc<dyn PlatformStrategy>,
    spreadsheet: Option<Arc<dyn SpreadsheetDriver>>,
    coder: CodeAgent,
    opts: GenOptions,
    scroll_unit: i32,
    wait_cap_secs: f64,
    ocr_keep: Vec<char>,
    observation: Option<Observation>,
    knowledge: Vec<String>,
    last_code_report: Option<CodeReport>,
}

impl Grounder {
    pub fn new(
        route: GroundRoute,
        locator: LlmClient,
        ocr: Arc<dyn TextLocator>,
        platform: Arc<dyn PlatformStrategy>,
        coder: CodeAgent,
        cfg: &AgentConfig,
    ) -> Self {
        let ocr_keep = cfg
            .ocr_keep_chars
            .as_ref()
            .map(|s| s.chars().collect())
            .unwrap_or_else(|| OCR_EDGE_KEEP.to_vec());
        Self {
            route,
            locator,
            ocr,
            platform,
            spreadsheet: None,
            coder,
            opts: GenOptions::with_temperature(0.0),
            scroll_unit: cfg.scroll_unit,
            wait_cap_secs: cfg.wait_cap_secs,
            ocr_keep,
            observation: None,
            knowledge: Vec::new(),
            last_code_report: None,
        }
    }

    pub fn with_spreadsheet(mut self, driver: Arc<dyn SpreadsheetDriver>) -> Self {
        self.spreadsheet = Some(driver);
        self
    }

    // ── Shared task state (mutated only between orchestrator phases) ──────────

    /// Bind this step's observation; resolvers and `compile` read it.
    pub fn bind_observation(&mut self, obs: Observation) {
        self.observation = Some(obs);
    }

    pub fn observation(&self) -> Option<&Observation> {
        self.observation.as_ref()
    }

    pub fn knowledge(&self) -> &[String] {
        &self.knowledge
    }

    pub fn last_code_report(&self) -> Option<&CodeReport> {
        self.last_code_report.as_ref()
    }

    // ── Coordinate resolution ─────────────────────────────────────────────────

    /// Resolve a natural-language element description to screen coordinates.
    ///
    /// The grounding model sees the grounding-space screenshot; the first two
    /// integers of its reply are taken as a canvas point and rescaled into
    /// screen space.
    pub async fn resolve_point(&self, description: &str) -> Result<(i32, i32), GroundError> {
        let obs = self.observation.as_ref().ok_or(GroundError::NoObservation)?;
        let prompt = GROUND_PROMPT.replace("{description}", description);

        let (gx, gy) = match &self.route {
            GroundRoute::Chat(client) => {
                let messages = [ChatMessage::user_with_parts(vec![
                    ContentPart::text(prompt),
                    ContentPart::image(obs.grounded.to_data_url()),
                ])];
                let reply = client.generate(&messages, &self.opts).await;
                first_two_ints(&reply).ok_or(GroundError::NoCoordinates { reply })?
            }
            GroundRoute::Server(server) => {
                let reply = server
                    .generate(&prompt, &obs.grounded.to_base64())
                    .await
                    .map_err(|e| GroundError::NoCoordinates { reply: e.to_string() })?;
                match reply.coordinates {
                    Some([x, y]) => (x, y),
                    None => first_two_ints(&reply.response)
                        .ok_or(GroundError::NoCoordinates { reply: reply.response })?,
                }
            }
        };

        let (x, y) = obs.to_screen(gx, gy);
        debug!(description, gx, gy, x, y, "resolved element");
        Ok((x, y))
    }

    /// Resolve a phrase to a point anchored on an OCR'd word.
    ///
    /// The text-locator model picks a word id from the rendered table; the
    /// last integer of its reply is the id.  OCR runs on the native-resolution
    /// screenshot, so the word box needs no rescaling.
    pub async fn resolve_text(
        &self,
        phrase: &str,
        alignment: Alignment,
    ) -> Result<(i32, i32), GroundError> {
        let obs = self.observation.as_ref().ok_or(GroundError::NoObservation)?;
        let elements = self
            .ocr
            .ocr(&obs.screen)
            .await
            .map_err(|e| GroundError::Ocr(e.to_string()))?;
        let table = render_ocr_table(&elements, &self.ocr_keep);

        let prompt = LOCATOR_PROMPT
            .replace("{alignment}", alignment.describe())
            .replace("{phrase}", phrase)
            .replace("{table}", &table);
        let messages = [ChatMessage::user_with_parts(vec![
            ContentPart::text(prompt),
            ContentPart::image(obs.screen.to_data_url()),
        ])];
        let reply = self.locator.generate(&messages, &self.opts).await;

        let id = last_int(&reply).ok_or(GroundError::NoCoordinates { reply })? as usize;
        let element = elements
            .get(id)
            .ok_or(GroundError::WordIdOutOfRange { id, count: elements.len() })?;
        let point = match alignment {
            Alignment::Start => element.bbox.left_mid(),
            Alignment::End => element.bbox.right_mid(),
            Alignment::Center => element.bbox.center(),
        };
        debug!(phrase, id, word = %element.text, ?point, "resolved text anchor");
        Ok(point)
    }

    // ── Action compilation ────────────────────────────────────────────────────

    /// Compile a typed action into its primitive sequence.
    ///
    /// `instruction` is the task text, used when the code agent is delegated
    /// without an explicit sub-task.
    pub async fn compile(
        &mut self,
        action: &AgentAction,
        instruction: &str,
    ) -> Result<CompiledStep, GroundError> {
        let step = match action {
            AgentAction::Click { description, num_clicks, button, hold_keys } => {
                let (x, y) = self.resolve_point(description).await?;
                let click = Primitive::Click { x, y, count: *num_clicks, button: *button };
                CompiledStep::Primitives(wrap_with_holds(hold_keys, vec![click]))
            }

            AgentAction::Type { description, text, overwrite, enter } => {
                let mut prims = Vec::new();
                if let Some(desc) = description {
                    let (x, y) = self.resolve_point(desc).await?;
                    prims.push(Primitive::Click {
                        x,
                        y,
                        count: 1,
                        button: iris_actions::MouseButton::Left,
                    });
                }
                if *overwrite {
                    prims.push(Primitive::Hotkey {
                        keys: vec![self.platform.command_modifier().into(), "a".into()],
                    });
                    prims.push(Primitive::PressBackspace);
                }
                if text.is_ascii() {
                    prims.push(Primitive::TypeText { text: text.clone() });
                } else {
                    // Non-ASCII input goes through the clipboard: key-event
                    // synthesis cannot express arbitrary unicode reliably.
                    prims.push(Primitive::ClipboardSet { text: text.clone() });
                    prims.push(Primitive::Hotkey {
                        keys: vec![self.platform.command_modifier().into(), "v".into()],
                    });
                }
                if *enter {
                    prims.push(Primitive::PressEnter);
                }
                CompiledStep::Primitives(prims)
            }

            AgentAction::Scroll { description, clicks, horizontal } => {
                let (x, y) = self.resolve_point(description).await?;
                CompiledStep::Primitives(vec![Primitive::Scroll {
                    x,
                    y,
                    ticks: clicks * self.scroll_unit,
                    horizontal: *horizontal,
                }])
            }

            AgentAction::DragAndDrop { start_desc, end_desc, hold_keys } => {
                let (x1, y1) = self.resolve_point(start_desc).await?;
                let (x2, y2) = self.resolve_point(end_desc).await?;
                let drag = Primitive::Drag {
                    x1,
                    y1,
                    x2,
                    y2,
                    duration: DRAG_DURATION_SECS,
                    button: iris_actions::MouseButton::Left,
                };
                CompiledStep::Primitives(wrap_with_holds(hold_keys, vec![drag]))
            }

            AgentAction::HighlightTextSpan { start_phrase, end_phrase, button } => {
                let (x1, y1) = self.resolve_text(start_phrase, Alignment::Start).await?;
                let (x2, y2) = self.resolve_text(end_phrase, Alignment::End).await?;
                CompiledStep::Primitives(vec![Primitive::Drag {
                    x1,
                    y1,
                    x2,
                    y2,
                    duration: DRAG_DURATION_SECS,
                    button: *button,
                }])
            }

            AgentAction::Hotkey { keys } => {
                CompiledStep::Primitives(vec![Primitive::Hotkey { keys: keys.clone() }])
            }

            AgentAction::HoldAndPress { hold_keys, press_keys } => {
                let mut prims: Vec<Primitive> = Vec::new();
                for k in hold_keys {
                    prims.push(Primitive::KeyDown { key: k.clone() });
                }
                for k in press_keys {
                    prims.push(Primitive::KeyDown { key: k.clone() });
                    prims.push(Primitive::KeyUp { key: k.clone() });
                }
                for k in hold_keys.iter().rev() {
                    prims.push(Primitive::KeyUp { key: k.clone() });
                }
                CompiledStep::Primitives(prims)
            }

            AgentAction::Wait { seconds } => {
                let capped = if *seconds > self.wait_cap_secs {
                    warn!(requested = seconds, cap = self.wait_cap_secs, "wait capped");
                    self.wait_cap_secs
                } else {
                    *seconds
                };
                CompiledStep::Primitives(vec![Primitive::Sleep { seconds: capped }])
            }

            AgentAction::Done => CompiledStep::Done,
            AgentAction::Fail => CompiledStep::Fail,

            AgentAction::CallCodeAgent { task } => {
                let task = task.as_deref().unwrap_or(instruction);
                let report = self.coder.run(task).await;
                debug!(outcome = %report.completion_reason, "code agent finished");
                self.last_code_report = Some(report);
                CompiledStep::NoOp
            }

            AgentAction::SwitchApplications { app_code } => {
                CompiledStep::Primitives(self.platform.switch_app(app_code))
            }

            AgentAction::Open { app_or_filename } => {
                CompiledStep::Primitives(self.platform.open_app(app_or_filename))
            }

            AgentAction::SaveToKnowledge { notes } => {
                self.knowledge.extend(notes.iter().cloned());
                CompiledStep::NoOp
            }

            AgentAction::SetCellValues { values, app, sheet } => {
                let driver =
                    self.spreadsheet.as_ref().ok_or(GroundError::NoSpreadsheetDriver)?;
                driver
                    .set_cells(app, sheet, values)
                    .await
                    .map_err(|e| GroundError::Spreadsheet(e.to_string()))?;
                CompiledStep::NoOp
            }
        };
        Ok(step)
    }
}

/// Wrap a primitive sequence in key-down/key-up pairs for held keys.
fn wrap_with_holds(hold_keys: &[String], inner: Vec<Primitive>) -> Vec<Primitive> {
    if hold_keys.is_empty() {
        return inner;
    }
    let mut out: Vec<Primitive> = Vec::with_capacity(inner.len() + 2 * hold_keys.len());
    for k in hold_keys {
        out.push(Primitive::KeyDown { key: k.clone() });
    }
    out.extend(inner);
    for k in hold_keys.iter().rev() {
        out.push(Primitive::KeyUp { key: k.clone() });
    }
    out
}

fn int_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-?\d+").unwrap())
}

/// First two integers in `reply`, if present.
fn first_two_ints(reply: &str) -> Option<(i32, i32)> {
    let mut it = int_regex().find_iter(reply);
    let x = it.next()?.as_str().parse().ok()?;
    let y = it.next()?.as_str().parse().ok()?;
    Some((x, y))
}

/// Last integer in `reply`, if present.
fn last_int(reply: &str) -> Option<i64> {
    int_regex()
        .find_iter(reply)
        .last()
        .and_then(|m| m.as_str().parse().ok())
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
