//! Label command handlers.

use promptledger::cli::render;

use super::{CommandContext, LabelAction};

/// Label command.
pub fn cmd_label(ctx: &CommandContext, action: LabelAction) -> anyhow::Result<()> {
    let ledger = ctx.open_ledger()?;

    match action {
        LabelAction::Set {
            id,
            version,
            name,
            actor,
        } => {
            let mv = match actor.as_deref() {
                Some(actor) => ledger.set_label_as(&id, version, &name, actor)?,
                None => ledger.set_label(&id, version, &name)?,
            };
            ctx.emit(&mv, || {
                let from = mv
                    .from_version
                    .map_or_else(|| "unset".to_string(), |v| format!("v{v}"));
                format!(
                    "Moved {}:{} from {from} to v{}\n",
                    mv.prompt_id, mv.label, mv.to_version
                )
            })
        },
        LabelAction::Get { id, name } => {
            let version = ledger.get_label(&id, &name)?;
            ctx.emit(&version, || format!("{version}\n"))
        },
        LabelAction::List { id } => {
            let labels = ledger.labels_for(&id)?;
            ctx.emit(&labels, || format!("{}\n", render::render_label_map(&labels)))
        },
        LabelAction::History { id } => {
            let moves = ledger.label_history(id.as_deref())?;
            ctx.emit(&moves, || render::render_label_moves(&moves))
        },
    }
}
