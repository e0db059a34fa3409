//! Follow relationship models.

use serde::Serialize;

/// Relationship between the requester and another user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowStatus {
    pub is_following: bool,
    pub is_followed_by: bool,
}

/// Follower and following totals for a user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowCounts {
    pub followers: i64,
    pub following: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_follow_status_serializes_camel_case() {
        let status = FollowStatus {
            is_following: true,
            is_followed_by: false,
        };
        let json = serde_json::to_value(status).unwrap();
        assert_eq!(json["isFollowing"], true);
        assert_eq!(json["isFollowedBy"], false);
    }
}
