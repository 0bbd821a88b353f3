//! Scripted sales assistant that walks the lead-conversation stages, one per turn.

use shared::protocol::{EmbeddedRecordPayload, StageIdValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stage {
    pub id: &'static str,
    pub label: &'static str,
    pub goal: &'static str,
}

pub const STAGES: [Stage; 5] = [
    Stage {
        id: "1",
        label: "Greeting",
        goal: "warmly greet the customer and introduce yourself and your company",
    },
    Stage {
        id: "2",
        label: "Lead Qualification",
        goal: "politely request the customer's name",
    },
    Stage {
        id: "3",
        label: "Needs Exploration",
        goal: "ask open-ended questions to uncover needs and pain points",
    },
    Stage {
        id: "4",
        label: "Solution Recommendation",
        goal: "suggest products that align with the customer's needs",
    },
    Stage {
        id: "5",
        label: "Lead Capture",
        goal: "request contact information to connect the customer with sales",
    },
];

const PRODUCT_SEARCH_TOOL: &str = "ProductSearch";

pub struct ScriptedAgent {
    agent_name: String,
    company_name: String,
    turns: usize,
    customer_notes: Vec<String>,
}

impl ScriptedAgent {
    pub fn new(agent_name: impl Into<String>, company_name: impl Into<String>) -> Self {
        Self {
            agent_name: agent_name.into(),
            company_name: company_name.into(),
            turns: 0,
            customer_notes: Vec::new(),
        }
    }

    /// Stage the next reply will be written in. The last stage repeats.
    pub fn stage(&self) -> &'static Stage {
        &STAGES[self.turns.min(STAGES.len() - 1)]
    }

    pub fn reply(&mut self, message: &str) -> EmbeddedRecordPayload {
        let stage = self.stage();
        self.turns += 1;

        let customer_information = if self.customer_notes.is_empty() {
            None
        } else {
            Some(self.customer_notes.join("; "))
        };
        self.customer_notes.push(format!("said \"{message}\""));

        let mut payload = EmbeddedRecordPayload {
            current_stage_id: Some(StageIdValue::Text(stage.id.to_string())),
            current_conversation_stage: Some(stage.label.to_string()),
            customer_information,
            thoughts: Some(vec![
                format!("The customer said: \"{message}\""),
                format!("We are in {}; I should {}.", stage.label, stage.goal),
            ]),
            final_thought: Some(format!("Reply in the {} stage.", stage.label)),
            final_response: Some(self.response_for(stage, message)),
            ..EmbeddedRecordPayload::default()
        };

        if stage.label == "Solution Recommendation" {
            payload.actions = Some(vec![PRODUCT_SEARCH_TOOL.to_string()]);
            payload.action_inputs = Some(vec![message.to_string()]);
            payload.observations = Some(vec![format!("3 catalogue items match \"{message}\"")]);
        }
        payload
    }

    fn response_for(&self, stage: &Stage, message: &str) -> String {
        match stage.id {
            "1" => format!(
                "Hello! I'm {} from {}. How can I help you today?",
                self.agent_name, self.company_name
            ),
            "2" => "Happy to help! May I have your name so I can tailor my suggestions?".into(),
            "3" => "Thanks! What are you shopping for, and what hasn't worked for you before?".into(),
            "4" => format!("Based on what you told me, here are three picks for \"{message}\"."),
            _ => "Would you like to leave an email or phone number so our sales team can follow up?"
                .into(),
        }
    }
}
