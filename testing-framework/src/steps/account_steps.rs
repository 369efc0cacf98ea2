//! Account balance preconditions

use anyhow::Result;
use futures::future::BoxFuture;

use super::{ensure_hbars_above, ScenarioContext, StepArgs, StepRegistry};

pub(super) fn register(registry: &mut StepRegistry) -> Result<(), regex::Error> {
    registry.register(r"a first account with more than (\d+) hbars", first_account)?;
    registry.register(r"A second account with more than (\d+) hbars", second_account)?;
    registry.register(r"A Hedera account with more than (\d+) hbar", first_account)?;
    Ok(())
}

/// Bind the first configured account as operator and check its balance
fn first_account(ctx: &mut ScenarioContext, args: StepArgs) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        let hbars: u64 = args.parse(0)?;
        let record = ctx.accounts().first()?.clone();

        ctx.bind_operator(&record);
        ctx.set_account(record.id);
        ctx.set_private_key(record.private_key);

        ensure_hbars_above(ctx.client().as_ref(), &record.id, hbars).await?;
        Ok(())
    })
}

/// Remember the second configured account; the operator stays as is
fn second_account(ctx: &mut ScenarioContext, args: StepArgs) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        let hbars: u64 = args.parse(0)?;
        let record = ctx.accounts().second()?.clone();

        ctx.set_second_account(record.id);
        ctx.set_second_private_key(record.private_key);

        ensure_hbars_above(ctx.client().as_ref(), &record.id, hbars).await?;
        Ok(())
    })
}
