pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
    Router,
};

use crate::state::AppState;
use crate::{
    ai, applications, auth, cover_letters, documents, keywords, notifications, payments, resumes,
};

/// PDF uploads for keyword extraction.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Auth
        .route("/api/auth/register", post(auth::handlers::handle_register))
        .route("/api/auth/login", post(auth::handlers::handle_login))
        .route("/api/auth/logout", post(auth::handlers::handle_logout))
        .route("/api/auth/me", get(auth::handlers::handle_me))
        .route(
            "/api/auth/verify/:token",
            get(auth::handlers::handle_verify_email),
        )
        // Templates and previews
        .route(
            "/api/templates",
            get(documents::handlers::handle_list_templates),
        )
        .route(
            "/api/documents/preview",
            post(documents::handlers::handle_preview),
        )
        // Resumes
        .route(
            "/api/resumes",
            get(resumes::handlers::handle_list).post(resumes::handlers::handle_create),
        )
        .route(
            "/api/resumes/:id",
            get(resumes::handlers::handle_get)
                .put(resumes::handlers::handle_update)
                .delete(resumes::handlers::handle_delete),
        )
        .route(
            "/api/resumes/:id/latex",
            get(resumes::handlers::handle_export_latex),
        )
        .route(
            "/api/resumes/:id/html",
            get(resumes::handlers::handle_export_html),
        )
        .route(
            "/api/resumes/:id/pdf",
            get(resumes::handlers::handle_export_pdf),
        )
        // Cover letters
        .route(
            "/api/cover-letters",
            get(cover_letters::handlers::handle_list).post(cover_letters::handlers::handle_create),
        )
        .route(
            "/api/cover-letters/:id",
            get(cover_letters::handlers::handle_get)
                .put(cover_letters::handlers::handle_update)
                .delete(cover_letters::handlers::handle_delete),
        )
        .route(
            "/api/cover-letters/:id/latex",
            get(cover_letters::handlers::handle_export_latex),
        )
        // Job applications
        .route(
            "/api/job-applications",
            get(applications::handlers::handle_list).post(applications::handlers::handle_create),
        )
        .route(
            "/api/job-applications/board",
            get(applications::handlers::handle_board),
        )
        .route(
            "/api/job-applications/:id",
            get(applications::handlers::handle_get)
                .put(applications::handlers::handle_update)
                .delete(applications::handlers::handle_delete),
        )
        .route(
            "/api/job-applications/:id/status",
            patch(applications::handlers::handle_move),
        )
        // Keywords
        .route(
            "/api/keywords/categorize",
            post(keywords::handlers::handle_categorize),
        )
        .route(
            "/api/keywords/extract",
            post(keywords::handlers::handle_extract),
        )
        .route(
            "/api/keywords/extract/pdf",
            post(keywords::handlers::handle_extract_pdf)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/api/keywords/match", post(keywords::handlers::handle_match))
        // Notifications
        .route(
            "/api/notifications",
            get(notifications::handlers::handle_list),
        )
        .route(
            "/api/notifications/unread-count",
            get(notifications::handlers::handle_unread_count),
        )
        .route(
            "/api/notifications/read-all",
            post(notifications::handlers::handle_mark_all_read),
        )
        .route(
            "/api/notifications/:id",
            axum::routing::delete(notifications::handlers::handle_delete),
        )
        .route(
            "/api/notifications/:id/read",
            patch(notifications::handlers::handle_mark_read),
        )
        .route(
            "/api/admin/notifications",
            post(notifications::handlers::handle_broadcast),
        )
        // Billing
        .route("/api/plans", get(payments::handlers::handle_list_plans))
        .route(
            "/api/payments/checkout",
            post(payments::handlers::handle_checkout),
        )
        .route(
            "/api/payments/verify",
            post(payments::handlers::handle_verify),
        )
        .route(
            "/api/subscription",
            get(payments::handlers::handle_get_subscription),
        )
        .route(
            "/api/subscription/cancel",
            post(payments::handlers::handle_cancel_subscription),
        )
        .route(
            "/api/webhooks/stripe",
            post(payments::handlers::handle_stripe_webhook),
        )
        .route(
            "/api/webhooks/razorpay",
            post(payments::handlers::handle_razorpay_webhook),
        )
        // Writing assistant (Pro)
        .route("/api/ai/summary", post(ai::handlers::handle_summary))
        .route(
            "/api/ai/improve-bullets",
            post(ai::handlers::handle_improve_bullets),
        )
        .route(
            "/api/ai/cover-letter",
            post(ai::handlers::handle_cover_letter),
        )
        .with_state(state)
}
