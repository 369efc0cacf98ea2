//! Consensus topic steps: keys, topic creation, publish and subscribe

use anyhow::{Context, Result};
use futures::future::BoxFuture;
use ledger_common::{
    crypto::{Key, KeyList},
    transaction::{Status, TopicCreateParams},
    ClientError, Operator, TopicMessage,
};
use log::{info, warn};

use super::{ensure_success, ScenarioContext, StepArgs, StepRegistry};
use crate::error::StepFailure;

pub(super) fn register(registry: &mut StepRegistry) -> Result<(), regex::Error> {
    registry.register(
        r"A (\d+) of (\d+) threshold key with the first and second account",
        threshold_key,
    )?;
    registry.register(
        r"A topic is created with the first account as the submit key",
        topic_with_first_key,
    )?;
    registry.register(
        r"A topic is created with the threshold key as the submit key",
        topic_with_threshold_key,
    )?;
    registry.register(r#"The message "([^"]*)" is published to the topic"#, publish)?;
    registry.register(
        r#"The message "([^"]*)" is received by the topic and can be printed to the console"#,
        receive,
    )?;
    registry.register(
        r#"The second account publishes the message "([^"]*)" to the topic"#,
        publish_as_second,
    )?;
    registry.register(
        r"A message published by the second account to the topic is rejected",
        rejected_as_second,
    )?;
    registry.register(r"The topic has (\d+) messages?", message_count)?;
    Ok(())
}

fn threshold_key(ctx: &mut ScenarioContext, args: StepArgs) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        let threshold: u32 = args.parse(0)?;
        let total: usize = args.parse(1)?;

        let members: Vec<Key> = vec![
            ctx.private_key()?.public_key().into(),
            ctx.second_private_key()?.public_key().into(),
        ];
        if total != members.len() {
            return Err(StepFailure::InvalidArgument(format!(
                "threshold key over {} members, the first and second account make {}",
                total,
                members.len()
            ))
            .into());
        }

        let key = KeyList::with_threshold(members, threshold)
            .map_err(|e| StepFailure::InvalidArgument(e.to_string()))?;
        info!("Threshold key: {}", key);
        ctx.set_threshold_key(key);
        Ok(())
    })
}

fn topic_with_first_key(ctx: &mut ScenarioContext, _: StepArgs) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        let submit_key = ctx.private_key()?.public_key();
        let params = TopicCreateParams {
            submit_key: Some(submit_key.into()),
            ..Default::default()
        };

        let receipt = ctx.client().create_topic(params).await?;
        ensure_success(&receipt)?;
        let topic_id = receipt
            .topic_id
            .context("Topic create receipt carries no topic id")?;

        info!("Created topic {} with submit key {}", topic_id, submit_key);
        ctx.set_topic_id(topic_id);
        ctx.set_active_topic(topic_id);
        Ok(())
    })
}

fn topic_with_threshold_key(ctx: &mut ScenarioContext, _: StepArgs) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        let submit_key = ctx.threshold_key()?.clone();
        info!("Creating topic with threshold submit key {}", submit_key);
        let params = TopicCreateParams {
            submit_key: Some(submit_key.into()),
            ..Default::default()
        };

        let receipt = ctx.client().create_topic(params).await?;
        ensure_success(&receipt)?;
        let topic_id = receipt
            .topic_id
            .context("Topic create receipt carries no topic id")?;

        info!("Created topic {}", topic_id);
        ctx.set_threshold_topic_id(topic_id);
        ctx.set_active_topic(topic_id);
        Ok(())
    })
}

fn publish(ctx: &mut ScenarioContext, args: StepArgs) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        let message = args.text(0)?;
        let topic_id = *ctx.active_topic()?;

        let receipt = ctx
            .client()
            .submit_message(&topic_id, message.as_bytes())
            .await
            .with_context(|| format!("Publishing to topic {} failed", topic_id))?;
        ensure_success(&receipt)?;
        info!(
            "Published message #{} to topic {}",
            receipt.topic_sequence_number.unwrap_or_default(),
            topic_id
        );
        Ok(())
    })
}

/// Wait for the first message of the active topic and compare it
///
/// The wait is bounded by the subscription timeout. Errors reported by
/// the feed are logged and the wait goes on.
fn receive(ctx: &mut ScenarioContext, args: StepArgs) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        let expected = args.text(0)?;
        let topic_id = *ctx.active_topic()?;
        let timeout = ctx.settings().subscription_timeout;

        let mut subscription = ctx.client().subscribe_topic(&topic_id).await?;
        let first = async {
            loop {
                match subscription.next().await {
                    Some(Ok(message)) => return Ok::<TopicMessage, ClientError>(message),
                    Some(Err(e)) => warn!("Error on subscription to topic {}: {}", topic_id, e),
                    None => {
                        return Err(ClientError::Subscription(format!(
                            "feed of topic {} closed",
                            topic_id
                        )))
                    }
                }
            }
        };

        let message = tokio::time::timeout(timeout, first)
            .await
            .map_err(|_| StepFailure::Timeout(timeout, format!("a message on topic {}", topic_id)))??;

        let text = String::from_utf8(message.contents)
            .map_err(|e| StepFailure::mismatch("message encoding", "UTF-8 text", e))?;
        info!(
            "Received message #{} on topic {}: {}",
            message.sequence_number, topic_id, text
        );
        println!("{}", text);

        if text != expected {
            return Err(StepFailure::mismatch("received message", expected, text).into());
        }
        Ok(())
    })
}

fn second_operator(ctx: &ScenarioContext) -> Result<Operator, StepFailure> {
    Ok(Operator::new(
        *ctx.second_account()?,
        ctx.second_private_key()?.clone(),
    ))
}

fn publish_as_second(ctx: &mut ScenarioContext, args: StepArgs) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        let message = args.text(0)?;
        let topic_id = *ctx.active_topic()?;
        let client = ctx.client_for(second_operator(ctx)?);

        let receipt = client
            .submit_message(&topic_id, message.as_bytes())
            .await
            .with_context(|| format!("Publishing to topic {} as the second account failed", topic_id))?;
        ensure_success(&receipt)?;
        info!("Second account published to topic {}", topic_id);
        Ok(())
    })
}

fn rejected_as_second(ctx: &mut ScenarioContext, _: StepArgs) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        let topic_id = *ctx.active_topic()?;
        let client = ctx.client_for(second_operator(ctx)?);

        match client.submit_message(&topic_id, b"unauthorized").await {
            Ok(receipt) => Err(StepFailure::ExpectedFailureMissing(format!(
                "publishing to topic {} as the second account ({})",
                topic_id, receipt.transaction_id
            ))
            .into()),
            Err(e) if e.status() == Some(Status::InvalidSignature) => {
                info!("Submission to topic {} rejected as expected: {}", topic_id, e);
                Ok(())
            }
            Err(e) => Err(StepFailure::mismatch(
                "rejection status",
                Status::InvalidSignature,
                e,
            )
            .into()),
        }
    })
}

fn message_count(ctx: &mut ScenarioContext, args: StepArgs) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        let expected: u64 = args.parse(0)?;
        let topic_id = *ctx.active_topic()?;

        let info = ctx.client().topic_info(&topic_id).await?;
        if info.sequence_number != expected {
            return Err(StepFailure::mismatch(
                format!("message count of topic {}", topic_id),
                expected,
                info.sequence_number,
            )
            .into());
        }
        Ok(())
    })
}
