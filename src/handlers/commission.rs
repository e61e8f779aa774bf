use crate::handlers::current_user;
use crate::models::CommissionQuery;
use crate::services::CommissionService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/commissions",
    tag = "commissions",
    params(CommissionQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "我的佣金明细（分页，含待结算/已结算总额）"),
        (status = 401, description = "未授权")
    )
)]
pub async fn get_my_commissions(
    commission_service: web::Data<CommissionService>,
    req: HttpRequest,
    query: web::Query<CommissionQuery>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };

    match commission_service
        .get_leader_commissions(user.user_id, &query)
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn commission_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/commissions").route("", web::get().to(get_my_commissions)));
}
