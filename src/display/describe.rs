//! Human-readable summary of a bound model.

use crate::component::{Category, ComponentKind};
use crate::exchange::Timing;
use crate::model::Model;
use std::fmt::Write;

pub fn describe_model(model: &Model) -> String {
    let mut out = String::new();
    let td = model.timedomain();
    let _ = writeln!(out, "MODEL '{}' [{:?}]", model.identifier(), model.status());
    let _ = writeln!(out, "--------------------------------------------------");
    let _ = writeln!(
        out,
        "time:  {} -> {} every {}s ({} steps, {})",
        td.first(),
        td.last(),
        td.step_seconds(),
        td.step_count(),
        td.calendar()
    );
    let _ = writeln!(out, "space: shape {:?}", model.spacedomain().shape().as_slice());

    for category in Category::ORDER {
        let component = model.component(category);
        let _ = writeln!(out, "\n[{}] {}", category, component.kind().name());
        if let ComponentKind::Process(process) = component.kind() {
            let def = process.definition();
            if !def.driving_data.is_empty() {
                let _ = writeln!(out, "  driving:    {}", join(def.driving_data.iter().map(|f| f.name)));
            }
            if !def.ancillary_data.is_empty() {
                let _ = writeln!(out, "  ancillary:  {}", join(def.ancillary_data.iter().map(|f| f.name)));
            }
            if !def.states.is_empty() {
                let _ = writeln!(
                    out,
                    "  states:     {} (history {})",
                    join(def.states.iter().map(|f| f.name)),
                    def.solver_history
                );
            }
            for (name, value) in component.constants() {
                let _ = writeln!(out, "  constant    {} = {}", name, value);
            }
        }
        for (producer, consumer, transfer) in model.exchange_plan().transfers() {
            if consumer != category {
                continue;
            }
            let lag = match transfer.timing {
                Timing::SameStep => "",
                Timing::PreviousStep => " (t-1)",
            };
            let _ = writeln!(
                out,
                "  <- {}{} from {}",
                model.exchange_plan().registry.name(transfer.slot),
                lag,
                producer
            );
        }
        for field in component.outwards() {
            let _ = writeln!(out, "  -> {} [{}]", field.name, field.units);
        }
    }
    out
}

fn join(names: impl Iterator<Item = &'static str>) -> String {
    names.collect::<Vec<_>>().join(", ")
}
