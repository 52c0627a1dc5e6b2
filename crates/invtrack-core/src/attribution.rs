use invtrack_models::invite::InviteSnapshot;

use crate::cache::InviteCache;

/// Pick the invite whose counter advanced since the cached observation.
///
/// `fresh` is scanned in fetch order and the first invite that has been used
/// at least once, is present in `cache`, and has a strictly higher counter
/// than its cached entry wins. When several invites advanced (concurrent
/// joins) only the first is returned; the others stay behind in the cache and
/// are reconciled by the next comparison.
///
/// Invites that were never cached cannot be attributed, since there is no
/// baseline to compare against.
pub fn attribute<'a>(
    cache: &InviteCache,
    fresh: &'a [InviteSnapshot],
) -> Option<&'a InviteSnapshot> {
    fresh.iter().find(|invite| {
        invite.uses != 0
            && cache
                .uses(&invite.code)
                .is_some_and(|cached| invite.uses > cached)
    })
}
