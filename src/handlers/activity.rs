use crate::error::AppError;
use crate::handlers::current_user;
use crate::models::*;
use crate::services::{ActivityService, TeamService};
use crate::utils::ROLE_ADMIN;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/activities",
    tag = "activities",
    request_body = CreateActivityRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "创建活动成功", body = ActivityResponse),
        (status = 400, description = "参数错误"),
        (status = 403, description = "仅管理员可创建")
    )
)]
pub async fn create_activity(
    activity_service: web::Data<ActivityService>,
    req: HttpRequest,
    request: web::Json<CreateActivityRequest>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };
    if user.role != ROLE_ADMIN {
        return Ok(AppError::Forbidden.error_response());
    }

    match activity_service.create_activity(request.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/activities",
    tag = "activities",
    params(ActivityQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "活动列表（分页）")
    )
)]
pub async fn list_activities(
    activity_service: web::Data<ActivityService>,
    query: web::Query<ActivityQuery>,
) -> Result<HttpResponse> {
    match activity_service.list_activities(&query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/activities/{activity_id}",
    tag = "activities",
    params(
        ("activity_id" = i64, Path, description = "活动ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "活动详情", body = ActivityResponse),
        (status = 404, description = "活动不存在")
    )
)]
pub async fn get_activity(
    activity_service: web::Data<ActivityService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match activity_service.get_activity(path.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/activities/{activity_id}/teams",
    tag = "activities",
    params(
        ("activity_id" = i64, Path, description = "活动ID"),
        ActivityTeamsQuery
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "活动的团列表，查看者社区的团排在前面"),
        (status = 404, description = "活动不存在")
    )
)]
pub async fn get_activity_teams(
    team_service: web::Data<TeamService>,
    req: HttpRequest,
    path: web::Path<i64>,
    query: web::Query<ActivityTeamsQuery>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };

    // 未显式指定社区时用查看者自己的社区做优先排序
    let mut query = query.into_inner();
    if query.community_id.is_none() {
        query.community_id = user.community_id;
    }

    match team_service
        .get_activity_teams(path.into_inner(), &query)
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn activity_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/activities")
            .route("", web::post().to(create_activity))
            .route("", web::get().to(list_activities))
            .route("/{activity_id}/teams", web::get().to(get_activity_teams))
            .route("/{activity_id}", web::get().to(get_activity)),
    );
}
