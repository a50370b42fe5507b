//! Adoption request command handlers.

use anyhow::{Result, bail};
use teadopto_core::resources::adoptions::{self, AdoptionRequest, AdoptionStatus};

use super::{ApiResultExt, Context, print_table, text};

const LOAD_FAILED_MESSAGE: &str = "Could not load adoption requests.";

pub async fn list(ctx: &Context) -> Result<()> {
    ctx.require_login()?;
    let requests = adoptions::list(ctx.client())
        .await
        .or_report(LOAD_FAILED_MESSAGE)?
        .into_items();
    if requests.is_empty() {
        println!("No adoption requests.");
        return Ok(());
    }

    let rows = requests
        .iter()
        .map(|r| {
            [
                r.id.to_string(),
                r.pet.to_string(),
                r.status.clone(),
                text(r.message.as_deref()),
                text(r.created_at.as_deref()),
            ]
        })
        .collect();
    print_table(["ID", "Pet", "Status", "Message", "Created"], rows);
    Ok(())
}

/// Clients may only touch their own pending requests; staff go straight through.
async fn check_client_may_edit(ctx: &Context, id: u64) -> Result<()> {
    let Some(user) = ctx.store().user() else {
        bail!("Login required. Run `teadopto login` first.");
    };
    if !ctx.store().is_client() {
        return Ok(());
    }

    let requests = adoptions::list(ctx.client())
        .await
        .or_report(LOAD_FAILED_MESSAGE)?
        .into_items();
    match requests.iter().find(|r| r.id == id) {
        None => bail!("Adoption request #{id} not found."),
        Some(request) if !request.editable_by(&user) => {
            bail!("Only your pending requests can be changed.")
        }
        Some(_) => Ok(()),
    }
}

pub async fn update(ctx: &Context, id: u64, message: &str) -> Result<()> {
    ctx.require_login()?;
    check_client_may_edit(ctx, id).await?;
    let request = adoptions::update_message(ctx.client(), id, message)
        .await
        .or_report("Could not update the adoption request.")?;
    print_request("Updated", &request);
    Ok(())
}

pub async fn set_status(ctx: &Context, id: u64, status: AdoptionStatus) -> Result<()> {
    ctx.require_login()?;
    if !ctx.store().user().is_some_and(|u| adoptions::can_review(u.role)) {
        bail!("Shelter or admin access required.");
    }
    let request = adoptions::set_status(ctx.client(), id, status)
        .await
        .or_report("Could not change the request status.")?;
    print_request("Reviewed", &request);
    Ok(())
}

pub async fn delete(ctx: &Context, id: u64) -> Result<()> {
    ctx.require_login()?;
    check_client_may_edit(ctx, id).await?;
    adoptions::delete(ctx.client(), id)
        .await
        .or_report("Could not delete the adoption request.")?;
    println!("Deleted adoption request #{id}");
    Ok(())
}

fn print_request(verb: &str, request: &AdoptionRequest) {
    println!(
        "{verb} adoption request #{} for pet #{} ({})",
        request.id, request.pet, request.status
    );
}
