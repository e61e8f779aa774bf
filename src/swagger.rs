use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.as_mut().unwrap();
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        )
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::activity::create_activity,
        handlers::activity::list_activities,
        handlers::activity::get_activity,
        handlers::activity::get_activity_teams,
        handlers::team::launch_team,
        handlers::team::join_team,
        handlers::team::quit_team,
        handlers::team::get_team_detail,
        handlers::team::get_my_teams,
        handlers::team::get_leader_teams,
        handlers::team::cancel_team,
        handlers::team::remove_member,
        handlers::commission::get_my_commissions,
    ),
    components(
        schemas(
            ActivityResponse,
            CreateActivityRequest,
            LaunchTeamRequest,
            LaunchTeamResponse,
            JoinTeamRequest,
            JoinTeamResponse,
            CancelTeamRequest,
            RemoveMemberRequest,
            TeamDetailResponse,
            MemberInfoResponse,
            MyTeamResponse,
            CommissionResponse,
            CommissionPageResponse,
            PaginationInfo,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "activities", description = "拼团活动"),
        (name = "teams", description = "拼团团队"),
        (name = "commissions", description = "团长佣金")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    );
}
