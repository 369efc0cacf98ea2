//! Fungible token steps: creation, mint, info assertions and balances

use anyhow::{Context, Result};
use futures::future::BoxFuture;
use ledger_common::{
    transaction::{TokenCreateParams, TokenSupplyType},
    AccountId, Operator, TokenInfo,
};
use log::info;

use super::{ensure_hbars_above, ensure_success, ScenarioContext, StepArgs, StepRegistry};
use crate::error::StepFailure;

const TOKEN_NAME: &str = "Test Token";
const TOKEN_SYMBOL: &str = "HTT";
const DEFAULT_INITIAL_SUPPLY: u64 = 1_000_000;
/// Amount the expected-failure mint step tries to mint
const FAILING_MINT_AMOUNT: u64 = 100;

pub(super) fn register(registry: &mut StepRegistry) -> Result<(), regex::Error> {
    registry.register(r"I create a token named Test Token \(HTT\)", create_token)?;
    registry.register(
        r"I create a fixed supply token named Test Token \(HTT\) with (\d+) tokens",
        create_fixed_supply_token,
    )?;
    registry.register(r#"The token has the name "([^"]*)""#, has_name)?;
    registry.register(r#"The token has the symbol "([^"]*)""#, has_symbol)?;
    registry.register(r"The token has (\d+) decimals", has_decimals)?;
    registry.register(r"The token is owned by the account", owned_by_account)?;
    registry.register(r"The total supply of the token is (\d+)", has_total_supply)?;
    registry.register(r"An attempt to mint (\d+) additional tokens succeeds", mint_succeeds)?;
    registry.register(r"An attempt to mint tokens fails", mint_fails)?;
    registry.register(
        r"A first hedera account with more than (\d+) hbar and (\d+) HTT tokens",
        first_account_with_tokens,
    )?;
    registry.register(
        r"A second Hedera account with (\d+) hbar and (\d+) HTT tokens",
        second_account_with_tokens,
    )?;
    registry.register(
        r"The first account transfers (\d+) HTT tokens to the second account",
        transfer_to_second,
    )?;
    Ok(())
}

/// Create "Test Token" with the current account as treasury and its key
/// as admin and supply key
async fn create(ctx: &mut ScenarioContext, supply: TokenSupply) -> Result<()> {
    let treasury = *ctx.account()?;
    let key = ctx.private_key()?.public_key();

    let (initial_supply, supply_type, max_supply) = match supply {
        TokenSupply::Infinite => (DEFAULT_INITIAL_SUPPLY, TokenSupplyType::Infinite, 0),
        TokenSupply::Fixed(amount) => (amount, TokenSupplyType::Finite, amount),
    };
    let params = TokenCreateParams {
        name: TOKEN_NAME.to_string(),
        symbol: TOKEN_SYMBOL.to_string(),
        decimals: 0,
        initial_supply,
        treasury,
        admin_key: Some(key.into()),
        supply_key: Some(key.into()),
        supply_type,
        max_supply,
    };

    let receipt = ctx.client().create_token(params).await?;
    ensure_success(&receipt)?;
    let token_id = receipt
        .token_id
        .context("Token create receipt carries no token id")?;

    info!(
        "Created token {} ({} {}) with treasury {}",
        token_id, initial_supply, TOKEN_SYMBOL, treasury
    );
    ctx.set_token_id(token_id);
    Ok(())
}

enum TokenSupply {
    Infinite,
    Fixed(u64),
}

fn create_token(ctx: &mut ScenarioContext, _: StepArgs) -> BoxFuture<'_, Result<()>> {
    Box::pin(create(ctx, TokenSupply::Infinite))
}

fn create_fixed_supply_token(
    ctx: &mut ScenarioContext,
    args: StepArgs,
) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        let supply: u64 = args.parse(0)?;
        create(ctx, TokenSupply::Fixed(supply)).await
    })
}

async fn token_info(ctx: &ScenarioContext) -> Result<TokenInfo> {
    let token_id = *ctx.token_id()?;
    let info = ctx
        .client()
        .token_info(&token_id)
        .await
        .with_context(|| format!("Info query for token {} failed", token_id))?;
    Ok(info)
}

fn has_name(ctx: &mut ScenarioContext, args: StepArgs) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        let expected = args.text(0)?;
        let info = token_info(ctx).await?;
        if info.name != expected {
            return Err(StepFailure::mismatch("token name", expected, info.name).into());
        }
        Ok(())
    })
}

fn has_symbol(ctx: &mut ScenarioContext, args: StepArgs) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        let expected = args.text(0)?;
        let info = token_info(ctx).await?;
        if info.symbol != expected {
            return Err(StepFailure::mismatch("token symbol", expected, info.symbol).into());
        }
        Ok(())
    })
}

fn has_decimals(ctx: &mut ScenarioContext, args: StepArgs) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        let expected: u32 = args.parse(0)?;
        let info = token_info(ctx).await?;
        if info.decimals != expected {
            return Err(StepFailure::mismatch("token decimals", expected, info.decimals).into());
        }
        Ok(())
    })
}

fn owned_by_account(ctx: &mut ScenarioContext, _: StepArgs) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        let account = *ctx.account()?;
        let info = token_info(ctx).await?;
        if info.treasury_account_id != account {
            return Err(
                StepFailure::mismatch("token treasury", account, info.treasury_account_id).into(),
            );
        }
        Ok(())
    })
}

fn has_total_supply(ctx: &mut ScenarioContext, args: StepArgs) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        let expected: u64 = args.parse(0)?;
        let info = token_info(ctx).await?;
        if info.total_supply != expected {
            return Err(
                StepFailure::mismatch("token total supply", expected, info.total_supply).into(),
            );
        }
        Ok(())
    })
}

fn mint_succeeds(ctx: &mut ScenarioContext, args: StepArgs) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        let amount: u64 = args.parse(0)?;
        let token_id = *ctx.token_id()?;

        let receipt = ctx
            .client()
            .mint_token(&token_id, amount)
            .await
            .with_context(|| format!("Minting {} units of token {} failed", amount, token_id))?;
        ensure_success(&receipt)?;
        info!(
            "Minted {} units of token {}, total supply {}",
            amount,
            token_id,
            receipt.total_supply.unwrap_or_default()
        );
        Ok(())
    })
}

/// Minting must fail; any failure passes the step
fn mint_fails(ctx: &mut ScenarioContext, _: StepArgs) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        let token_id = *ctx.token_id()?;

        match ctx.client().mint_token(&token_id, FAILING_MINT_AMOUNT).await {
            Ok(receipt) => Err(StepFailure::ExpectedFailureMissing(format!(
                "minting {} units of token {} ({})",
                FAILING_MINT_AMOUNT, token_id, receipt.transaction_id
            ))
            .into()),
            Err(e) => {
                info!("Minting token {} failed as expected: {}", token_id, e);
                Ok(())
            }
        }
    })
}

/// Require at least `minimum` units of the scenario's token
async fn ensure_token_balance(
    ctx: &ScenarioContext,
    account: &AccountId,
    hbars: u64,
    minimum: u64,
) -> Result<()> {
    let token_id = *ctx.token_id()?;
    let balance = ensure_hbars_above(ctx.client().as_ref(), account, hbars).await?;

    let held = balance.token(&token_id).ok_or_else(|| {
        StepFailure::PreconditionNotMet(format!(
            "account {} is not associated with token {}",
            account, token_id
        ))
    })?;
    if held < minimum {
        return Err(StepFailure::PreconditionNotMet(format!(
            "account {} holds {} units of token {}, needs at least {}",
            account, held, token_id, minimum
        ))
        .into());
    }
    info!("Account {} holds {} units of token {}", account, held, token_id);
    Ok(())
}

fn first_account_with_tokens(
    ctx: &mut ScenarioContext,
    args: StepArgs,
) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        let hbars: u64 = args.parse(0)?;
        let tokens: u64 = args.parse(1)?;
        let record = ctx.accounts().first()?.clone();

        ctx.bind_operator(&record);
        ctx.set_account(record.id);
        ctx.set_private_key(record.private_key);

        ensure_token_balance(ctx, &record.id, hbars, tokens).await
    })
}

fn second_account_with_tokens(
    ctx: &mut ScenarioContext,
    args: StepArgs,
) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        let hbars: u64 = args.parse(0)?;
        let tokens: u64 = args.parse(1)?;
        let record = ctx.accounts().second()?.clone();

        ctx.set_second_account(record.id);
        ctx.set_second_private_key(record.private_key);

        ensure_token_balance(ctx, &record.id, hbars, tokens).await
    })
}

/// Associate the token with the second account when needed, then move
/// `amount` units from the first account
fn transfer_to_second(ctx: &mut ScenarioContext, args: StepArgs) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        let amount: u64 = args.parse(0)?;
        let token_id = *ctx.token_id()?;
        let from = *ctx.account()?;
        let to = *ctx.second_account()?;

        let receiver = ctx.client_for(Operator::new(to, ctx.second_private_key()?.clone()));
        let balance = receiver.account_balance(&to).await?;
        if balance.token(&token_id).is_none() {
            let receipt = receiver
                .associate_token(&to, &token_id)
                .await
                .with_context(|| format!("Associating token {} with {} failed", token_id, to))?;
            ensure_success(&receipt)?;
            info!("Associated token {} with account {}", token_id, to);
        }

        let sender = ctx.client_for(Operator::new(from, ctx.private_key()?.clone()));
        let receipt = sender
            .transfer_token(&token_id, &from, &to, amount)
            .await
            .with_context(|| format!("Transferring {} units of token {} failed", amount, token_id))?;
        ensure_success(&receipt)?;
        info!(
            "Transferred {} units of token {} from {} to {}",
            amount, token_id, from, to
        );
        Ok(())
    })
}
