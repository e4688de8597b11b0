//! Scenario - named steps run against one node.

use crate::expect::Delivered;
use crate::{Expect, HarnessResult, Recorder};
use arbor_node::Node;

type StepFn = Box<dyn FnOnce(&Node) -> HarnessResult<()>>;

struct Step {
    name: String,
    run: StepFn,
    expect: Expect,
}

/// A sequence of steps against a node observed by a `Recorder`.
///
/// The recorder attaches when the scenario runs; its initial emission is
/// checked by an optional `initial` expectation. Each step is checked only
/// against what it delivered itself.
pub struct Scenario {
    name: String,
    node: Node,
    initial: Option<Expect>,
    steps: Vec<Step>,
}

impl Scenario {
    pub fn new(name: impl Into<String>, node: &Node) -> Self {
        Self {
            name: name.into(),
            node: node.clone(),
            initial: None,
            steps: Vec::new(),
        }
    }

    /// Expectations for the emission made on subscription.
    pub fn initial(mut self, build: impl FnOnce(Expect) -> Expect) -> Self {
        self.initial = Some(build(Expect::new()));
        self
    }

    pub fn step(
        mut self,
        name: impl Into<String>,
        run: impl FnOnce(&Node) -> HarnessResult<()> + 'static,
        build: impl FnOnce(Expect) -> Expect,
    ) -> Self {
        self.steps.push(Step {
            name: name.into(),
            run: Box::new(run),
            expect: build(Expect::new()),
        });
        self
    }

    /// Run every step in order, stopping at the first failure.
    ///
    /// Returns the recorder so callers can inspect the full history.
    pub fn run(self) -> HarnessResult<Recorder> {
        let recorder = Recorder::attach(&self.node);
        if let Some(initial) = &self.initial {
            let step = format!("{}::initial", self.name);
            initial.verify(&step, &since(&recorder, (0, 0, 0)))?;
        }

        for step in self.steps {
            let mark = (
                recorder.value_count(),
                recorder.error_count(),
                recorder.completions(),
            );
            (step.run)(&self.node)?;
            let name = format!("{}::{}", self.name, step.name);
            step.expect.verify(&name, &since(&recorder, mark))?;
        }
        Ok(recorder)
    }
}

fn since(recorder: &Recorder, (values, errors, completions): (usize, usize, usize)) -> Delivered {
    Delivered {
        values: recorder.values().split_off(values),
        errors: recorder.errors().split_off(errors),
        completions: recorder.completions() - completions,
    }
}
