//! The combine palette: one listing made of several palettes.
//!
//! Every item is tagged with the member it came from. A member that fails to
//! resolve or list is skipped and reported in [`Listing::failures`]; the
//! other members still contribute.

use serde_json::Value;

use super::{find_by_name, Listing, MemberFailure, Palette, PaletteContext, PickOutcome};
use crate::core::{PalError, PalResult, PALETTE_TAG};

pub(super) fn list(name: &str, members: &[String], ctx: &PaletteContext<'_>) -> Listing {
    let ctx = ctx.descend(name);
    let mut listing = Listing::default();

    for member in members {
        match list_member(member, &ctx) {
            Ok(nested) => {
                tracing::debug!(
                    palette = name,
                    member = %member,
                    count = nested.items.len(),
                    "Listed member"
                );
                listing.items.extend(nested.items.into_iter().map(|item| tag(item, member)));
                listing.failures.extend(nested.failures);
            }
            Err(e) => {
                tracing::debug!(palette = name, member = %member, error = %e, "Skipping member");
                listing
                    .failures
                    .push(MemberFailure { palette: member.clone(), reason: e.to_string() });
            }
        }
    }

    listing
}

/// Re-list, find the item, and hand the pick to the member it came from.
pub(super) fn pick(
    name: &str,
    members: &[String],
    ctx: &PaletteContext<'_>,
    item_name: &str,
) -> PalResult<PickOutcome> {
    let listing = list(name, members, ctx);
    let Some(item) = find_by_name(&listing.items, item_name) else {
        return Ok(PickOutcome::NotFound);
    };
    let Some(member) = item.palette_tag() else {
        return Ok(PickOutcome::NotFound);
    };

    let ctx = ctx.descend(name);
    Palette::resolve(member, &ctx)?.pick(&ctx, item_name)
}

fn list_member(member: &str, ctx: &PaletteContext<'_>) -> PalResult<Listing> {
    if ctx.is_expanding(member) {
        return Err(PalError::IncludeCycle(member.to_string()));
    }
    Palette::resolve(member, ctx)?.list(ctx)
}

fn tag(item: Value, member: &str) -> Value {
    match item {
        Value::Object(mut map) => {
            map.insert(PALETTE_TAG.to_string(), Value::String(member.to_string()));
            Value::Object(map)
        }
        other => other,
    }
}
