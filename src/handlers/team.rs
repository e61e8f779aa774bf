use crate::handlers::current_user;
use crate::models::*;
use crate::services::TeamService;
use crate::utils::{ROLE_ADMIN, ROLE_LEADER};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/teams/launch",
    tag = "teams",
    request_body = LaunchTeamRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "发起拼团成功", body = LaunchTeamResponse),
        (status = 401, description = "未授权"),
        (status = 403, description = "非团长"),
        (status = 409, description = "活动不在进行中")
    )
)]
pub async fn launch_team(
    team_service: web::Data<TeamService>,
    req: HttpRequest,
    request: web::Json<LaunchTeamRequest>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };
    if user.role != ROLE_LEADER && user.role != ROLE_ADMIN {
        return Ok(crate::error::AppError::Forbidden.error_response());
    }

    match team_service.launch_team(user.user_id, request.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/teams/{team_id}/join",
    tag = "teams",
    params(
        ("team_id" = i64, Path, description = "团ID")
    ),
    request_body = JoinTeamRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "参团成功", body = JoinTeamResponse),
        (status = 401, description = "未授权"),
        (status = 402, description = "余额不足"),
        (status = 409, description = "团不可参加/已参加")
    )
)]
pub async fn join_team(
    team_service: web::Data<TeamService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<JoinTeamRequest>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };

    match team_service
        .join_team(path.into_inner(), user.user_id, request.into_inner())
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/teams/{team_id}/quit",
    tag = "teams",
    params(
        ("team_id" = i64, Path, description = "团ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "退团成功"),
        (status = 401, description = "未授权"),
        (status = 409, description = "团已结束或非成员")
    )
)]
pub async fn quit_team(
    team_service: web::Data<TeamService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };

    match team_service.quit_team(path.into_inner(), user.user_id).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": null
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/teams/{team_id}",
    tag = "teams",
    params(
        ("team_id" = i64, Path, description = "团ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "团详情", body = TeamDetailResponse),
        (status = 404, description = "团不存在")
    )
)]
pub async fn get_team_detail(
    team_service: web::Data<TeamService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match team_service.get_team_detail(path.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/teams/my",
    tag = "teams",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "我参与的拼团列表"),
        (status = 401, description = "未授权")
    )
)]
pub async fn get_my_teams(
    team_service: web::Data<TeamService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };

    match team_service.get_my_teams(user.user_id).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/teams/leader",
    tag = "teams",
    params(LeaderTeamsQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "团长发起的拼团（分页）"),
        (status = 401, description = "未授权")
    )
)]
pub async fn get_leader_teams(
    team_service: web::Data<TeamService>,
    req: HttpRequest,
    query: web::Query<LeaderTeamsQuery>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };

    match team_service.get_leader_teams(user.user_id, &query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/teams/{team_id}/cancel",
    tag = "teams",
    params(
        ("team_id" = i64, Path, description = "团ID")
    ),
    request_body = CancelTeamRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "取消拼团成功（全员退款）"),
        (status = 403, description = "仅团长可取消"),
        (status = 409, description = "团已结束")
    )
)]
pub async fn cancel_team(
    team_service: web::Data<TeamService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<CancelTeamRequest>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };

    match team_service
        .cancel_team(path.into_inner(), user.user_id, request.into_inner().reason)
        .await
    {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": null
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/teams/{team_id}/members/{member_id}/remove",
    tag = "teams",
    params(
        ("team_id" = i64, Path, description = "团ID"),
        ("member_id" = i64, Path, description = "参团记录ID")
    ),
    request_body = RemoveMemberRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "移除成员成功（退款）"),
        (status = 403, description = "仅团长可移除"),
        (status = 409, description = "团已结束或非成员")
    )
)]
pub async fn remove_member(
    team_service: web::Data<TeamService>,
    req: HttpRequest,
    path: web::Path<(i64, i64)>,
    request: web::Json<RemoveMemberRequest>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };

    let (team_id, member_id) = path.into_inner();
    match team_service
        .remove_member(team_id, member_id, user.user_id, request.into_inner().reason)
        .await
    {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": null
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn team_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/teams")
            .route("/launch", web::post().to(launch_team))
            .route("/my", web::get().to(get_my_teams))
            .route("/leader", web::get().to(get_leader_teams))
            .route("/{team_id}/join", web::post().to(join_team))
            .route("/{team_id}/quit", web::post().to(quit_team))
            .route("/{team_id}/cancel", web::post().to(cancel_team))
            .route(
                "/{team_id}/members/{member_id}/remove",
                web::post().to(remove_member),
            )
            .route("/{team_id}", web::get().to(get_team_detail)),
    );
}
