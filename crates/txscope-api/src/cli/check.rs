//! `txscope check`: initialize the plugin and drive one empty unit of work
//! through the same hooks a request would.

use anyhow::Result;
use console::style;

use txscope_core::session::SessionFactory;
use txscope_types::transaction::Completion;

use crate::state::{AppState, RequestUnitOfWork};

pub async fn check(state: &AppState, json: bool) -> Result<()> {
    let ctx = RequestUnitOfWork::new();

    state.uow.on_request_received(&ctx).await?;
    let status = ctx.transaction().await?;
    let completion = state.uow.on_request_finally(&ctx).await;
    state.uow.shutdown().await;

    let healthy = completion == Some(Completion::Committed);
    let unit = state.uow.factory().persistence_unit();

    if json {
        let result = serde_json::json!({
            "plugin": state.uow.name(),
            "persistence_unit": unit,
            "request_id": ctx.request_id(),
            "transaction": status,
            "completion": completion.map(|c| c.as_str()),
            "healthy": healthy,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let check_mark = |ok: bool| {
        if ok {
            format!("{}", style("✓").green())
        } else {
            format!("{}", style("✗").red())
        }
    };

    println!();
    println!(
        "  Checking plugin '{}' on unit '{}'",
        style(state.uow.name()).cyan(),
        style(unit).cyan()
    );
    println!();
    println!("  {} Session factory built", check_mark(true));
    println!("  {} Transaction began ({status})", check_mark(status.is_active()));
    println!(
        "  {} Unit of work ended: {}",
        check_mark(healthy),
        completion.map(|c| c.as_str()).unwrap_or("none")
    );
    println!();

    if !healthy {
        anyhow::bail!("unit of work did not commit");
    }
    Ok(())
}
