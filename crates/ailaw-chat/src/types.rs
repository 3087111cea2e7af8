/// Auxiliary progress shown while an answer is being produced.
///
/// Fed by `status`, `plan` and `cot_step` frames; cleared when the answer
/// finishes or fails.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Progress {
    /// Latest free-form status line.
    pub status: Option<String>,

    /// Chain-of-thought plan, in order.
    pub plan: Vec<String>,

    /// Why the plan looks the way it does. Empty when the server gave none.
    pub rationale: String,

    /// 1-based index of the running step.
    pub current_step: Option<u32>,

    pub total_steps: Option<u32>,

    pub step_description: Option<String>,
}

impl Progress {
    pub fn is_empty(&self) -> bool {
        *self == Progress::default()
    }

    pub fn clear(&mut self) {
        *self = Progress::default();
    }

    /// "step 2/4: apply the statute", when a step is running.
    pub fn step_line(&self) -> Option<String> {
        let (current, total) = (self.current_step?, self.total_steps?);
        Some(match self.step_description.as_deref().filter(|d| !d.is_empty()) {
            Some(desc) => format!("step {current}/{total}: {desc}"),
            None => format!("step {current}/{total}"),
        })
    }
}
