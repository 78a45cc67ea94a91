use fsim_core::{Error, Result};
use serde_json::{Value, json};

pub const MATCH_DESIGN: &str = "match_design";

/// Prompt capability: purely textual scripts, no execution.
#[derive(Debug, Default)]
pub struct PromptRegistry;

impl PromptRegistry {
    pub fn new() -> Self {
        PromptRegistry
    }

    pub fn list(&self) -> Value {
        json!({
            "prompts": [{
                "name": MATCH_DESIGN,
                "description": "Iterate a Flutter screen until it matches a target design",
                "arguments": [{
                    "name": "design_reference",
                    "description": "Description or path of the design to match",
                    "required": true
                }]
            }]
        })
    }

    pub fn get(&self, name: &str, arguments: &Value) -> Result<Value> {
        if name != MATCH_DESIGN {
            return Err(Error::InvalidParams(format!("unknown prompt: {name}")));
        }
        let design = arguments
            .get("design_reference")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                Error::InvalidParams("missing design_reference argument".to_string())
            })?;

        let script = format!(
            "Iterate the Flutter app toward this design: {design}\n\
             \n\
             1. Build the app with the `build` tool and fix any compile errors.\n\
             2. Start a simulator (`start_simulator`, or let `full_workflow` pick one) \
             and launch the app.\n\
             3. Capture the current screen with the `screenshot` tool.\n\
             4. Compare the screenshot against the design reference: layout, spacing, \
             typography, colors.\n\
             5. Edit the Flutter code to close the largest visual gap, then repeat from \
             step 1 until the screenshot matches the design."
        );

        Ok(json!({
            "description": "Build-run-screenshot-compare loop for design matching",
            "messages": [{
                "role": "user",
                "content": { "type": "text", "text": script }
            }]
        }))
    }
}
