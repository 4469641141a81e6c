//! Platform API Integration Tests
//!
//! Tests for platform domain models, authorization, and error handling.

use fb_platform::{AuthContext, Feature, Role, TsidGenerator, User};

// Unit tests for domain models
mod domain_tests {
    use super::*;

    #[test]
    fn test_user_creation() {
        let user = User::new("alice", "alice@example.com", "$argon2id$stub");
        assert_eq!(user.username, "alice");
        assert_eq!(user.email, "alice@example.com");
        assert_eq!(user.role, Role::User);
        assert!(!user.is_admin());
        assert!(TsidGenerator::is_valid(&user.id));
    }

    #[test]
    fn test_feature_creation() {
        let author = TsidGenerator::generate();
        let feature = Feature::new("Dark mode", "Add a dark theme", &author);

        assert_eq!(feature.status, "New");
        assert_eq!(feature.user, author);
        assert!(feature.votes.is_empty());
        assert!(feature.comments.is_empty());
        assert!(TsidGenerator::is_valid(&feature.id));
    }

    #[test]
    fn test_feature_with_image_url() {
        let feature = Feature::new("Dark mode", "desc", "author")
            .with_image_url("https://example.com/mock.png");
        assert_eq!(feature.image_url.as_deref(), Some("https://example.com/mock.png"));
    }

    #[test]
    fn test_vote_membership_is_a_set() {
        let mut feature = Feature::new("Dark mode", "desc", "author");
        let voter = TsidGenerator::generate();

        assert!(feature.toggle_vote(&voter));
        assert!(!feature.toggle_vote(&voter));
        assert!(feature.toggle_vote(&voter));

        // Never more than one entry per user
        let count = feature.votes.iter().filter(|v| v.user == voter).count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_comment_ids_locate_comments() {
        let mut feature = Feature::new("Dark mode", "desc", "author");
        let comment = feature.add_comment("u2", "nice");

        assert!(TsidGenerator::is_valid(&comment.id));
        assert_eq!(feature.comment(&comment.id).unwrap().text, "nice");
        assert!(feature.comment("0000000000000").is_none());
    }
}

// Authorization context tests
mod authorization_tests {
    use super::*;
    use fb_platform::checks;

    #[test]
    fn test_context_mirrors_the_user_document() {
        let user = User::new("alice", "alice@example.com", "$argon2id$stub");
        let ctx = AuthContext::from_user(&user);

        assert_eq!(ctx.user_id, user.id);
        assert_eq!(ctx.username, "alice");
        assert_eq!(ctx.role, Role::User);
    }

    #[test]
    fn test_admin_gate_is_role_exact() {
        let mut user = User::new("adminuser", "admin@example.com", "$argon2id$stub");

        // A username containing "admin" does not grant admin
        let ctx = AuthContext::from_user(&user);
        assert!(checks::require_admin(&ctx).is_err());

        user.role = Role::Admin;
        let ctx = AuthContext::from_user(&user);
        assert!(checks::require_admin(&ctx).is_ok());
    }
}

// Token round-trip tests
mod token_tests {
    use super::*;
    use fb_platform::auth::{AuthConfig, AuthService};

    #[test]
    fn test_token_round_trip_carries_identity() {
        let service = AuthService::new(AuthConfig {
            secret_key: "integration-secret".to_string(),
            ..AuthConfig::default()
        });

        let mut user = User::new("root", "root@example.com", "$argon2id$stub");
        user.role = Role::Admin;

        let token = service.generate_token(&user).unwrap();
        let claims = service.validate_token(&token).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.role, Role::Admin);
        // 30-day expiry
        assert_eq!(claims.exp - claims.iat, 86400 * 30);
    }
}

// Scenario walk-through: one feature, a vote toggle pair, a comment edit
mod scenario_tests {
    use super::*;

    #[test]
    fn test_board_scenario() {
        let u1 = User::new("firstuser", "u1@example.com", "$argon2id$stub");
        let u2 = User::new("seconduser", "u2@example.com", "$argon2id$stub");

        let mut feature = Feature::new("Dark mode", "Add a dark theme", &u1.id);
        assert_eq!(feature.status, "New");

        // U1 votes, then un-votes: the vote set is restored
        assert!(feature.toggle_vote(&u1.id));
        assert_eq!(feature.vote_count(), 1);
        assert!(!feature.toggle_vote(&u1.id));
        assert_eq!(feature.vote_count(), 0);

        // U2 comments, then the comment is edited in place
        let comment = feature.add_comment(&u2.id, "nice");
        assert_eq!(feature.comment_count(), 1);

        feature.comment_mut(&comment.id).unwrap().text = "great".to_string();
        assert_eq!(feature.comment(&comment.id).unwrap().text, "great");

        // Edit did not touch identity or ordering
        assert_eq!(feature.comments[0].id, comment.id);
        assert_eq!(feature.comments[0].user, u2.id);
    }
}
