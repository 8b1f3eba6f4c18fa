//! posts, comments and likes
pub mod handlers;

use actix_web::{delete, get, post, put, web, HttpRequest, Responder};

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::utils::respond::gen_extra_respond;
use crate::utils::AppContext;

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

/**
 * @api {get} /post/posts 帖子列表，按时间倒序
 * @apiVersion 0.0.1
 * @apiName ListPosts
 * @apiGroup Post
 * @apiHeader {String} [Authorization]  user's access token, fills request_user_liked
 * @apiQuery {Number} [page=1]         page number
 * @apiQuery {Number} [page_size=10]   at most 100
 * @apiExample {curl} Example usage:
 *   curl -X GET "http://127.0.0.1:8066/post/posts?page=1&page_size=10"
 * @apiSuccess {string=0,1,2,3,5} status_code         status code.
 * @apiSuccess {string=Successfully,InternalError,RequestParamInvalid,Authorization} msg
 * @apiSuccess {object} data                {count, page, page_size, results}.
 * @apiSampleRequest http://127.0.0.1:8066/post/posts
 */
#[tracing::instrument(skip_all,fields(trace_id = common::log::generate_trace_id()))]
#[get("/post/posts")]
async fn list_posts(
    req: HttpRequest,
    ctx: web::Data<AppContext>,
    query: web::Query<PageQuery>,
) -> impl Responder {
    debug!("{:?}", query.0);
    gen_extra_respond(handlers::post::list_req(req, &ctx, query.into_inner()).await)
}

/**
 * @api {post} /post/posts/create 发帖
 * @apiVersion 0.0.1
 * @apiName CreatePost
 * @apiGroup Post
 * @apiHeader {String} Authorization  user's access token
 * @apiBody {String} media     png/jpg/jpeg/gif/mp4/avi/mov/mkv/heic
 * @apiBody {String} caption   up to 2000 characters
 * @apiExample {curl} Example usage:
 *   curl -X POST http://127.0.0.1:8066/post/posts/create -H "Content-Type: application/json"
 *   -H "Authorization: Bearer eyJ0eXAiOiJKV1Q..." -d '{"media":"uploads/sunset.jpg","caption":"sunset"}'
 * @apiSuccess {string=0,1,2,3,5} status_code         status code.
 * @apiSuccess {string=Successfully,InternalError,RequestParamInvalid,Authorization} msg
 * @apiSuccess {object} data                the new post.
 * @apiSampleRequest http://127.0.0.1:8066/post/posts/create
 */
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct CreatePostRequest {
    pub media: String,
    #[serde(default)]
    pub caption: String,
}
#[tracing::instrument(skip_all,fields(trace_id = common::log::generate_trace_id()))]
#[post("/post/posts/create")]
async fn create_post(
    req: HttpRequest,
    ctx: web::Data<AppContext>,
    request_data: web::Json<CreatePostRequest>,
) -> impl Responder {
    debug!("{:?}", request_data.0);
    gen_extra_respond(handlers::post::create_req(req, &ctx, request_data.into_inner()).await)
}

/**
 * @api {get} /post/posts/:id 帖子详情
 * @apiVersion 0.0.1
 * @apiName PostDetail
 * @apiGroup Post
 * @apiHeader {String} [Authorization]  user's access token, fills request_user_liked
 * @apiParam {String} id   post id
 * @apiExample {curl} Example usage:
 *   curl -X GET http://127.0.0.1:8066/post/posts/67e55044-10b1-426f-9247-bb680e5fe0c8
 * @apiSuccess {string=0,1,2,3,5,3001} status_code         status code.
 * @apiSuccess {string=Successfully,InternalError,RequestParamInvalid,Authorization,NotFound} msg
 * @apiSuccess {object} data                post with likes_count, comments_count, request_user_liked.
 * @apiSampleRequest http://127.0.0.1:8066/post/posts/:id
 */
#[tracing::instrument(skip_all,fields(trace_id = common::log::generate_trace_id()))]
#[get("/post/posts/{id}")]
async fn post_detail(
    req: HttpRequest,
    ctx: web::Data<AppContext>,
    post_id: web::Path<Uuid>,
) -> impl Responder {
    gen_extra_respond(handlers::post::detail_req(req, &ctx, post_id.into_inner()).await)
}

/**
 * @api {put} /post/posts/:id 修改帖子，仅作者
 * @apiVersion 0.0.1
 * @apiName UpdatePost
 * @apiGroup Post
 * @apiHeader {String} Authorization  author's access token
 * @apiParam {String} id   post id
 * @apiBody {String} [media]     new media reference
 * @apiBody {String} [caption]   new caption
 * @apiExample {curl} Example usage:
 *   curl -X PUT http://127.0.0.1:8066/post/posts/67e55044-10b1-426f-9247-bb680e5fe0c8
 *   -H "Content-Type: application/json" -H "Authorization: Bearer eyJ0eXAiOiJKV1Q..." -d '{"caption":"golden hour"}'
 * @apiSuccess {string=0,1,2,3,5,3001,3002} status_code         status code.
 * @apiSuccess {string=Successfully,InternalError,RequestParamInvalid,Authorization,NotFound,PermissionDenied} msg
 * @apiSuccess {object} data                the updated post.
 * @apiSampleRequest http://127.0.0.1:8066/post/posts/:id
 */
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct UpdatePostRequest {
    pub media: Option<String>,
    pub caption: Option<String>,
}
#[tracing::instrument(skip_all,fields(trace_id = common::log::generate_trace_id()))]
#[put("/post/posts/{id}")]
async fn update_post(
    req: HttpRequest,
    ctx: web::Data<AppContext>,
    post_id: web::Path<Uuid>,
    request_data: web::Json<UpdatePostRequest>,
) -> impl Responder {
    debug!("{:?}", request_data.0);
    gen_extra_respond(
        handlers::post::update_req(req, &ctx, post_id.into_inner(), request_data.into_inner())
            .await,
    )
}

/**
 * @api {delete} /post/posts/:id 删除帖子及其评论和点赞，仅作者
 * @apiVersion 0.0.1
 * @apiName DeletePost
 * @apiGroup Post
 * @apiHeader {String} Authorization  author's access token
 * @apiParam {String} id   post id
 * @apiExample {curl} Example usage:
 *   curl -X DELETE http://127.0.0.1:8066/post/posts/67e55044-10b1-426f-9247-bb680e5fe0c8
 *   -H "Authorization: Bearer eyJ0eXAiOiJKV1Q..."
 * @apiSuccess {string=0,1,2,3,5,3001,3002} status_code         status code.
 * @apiSuccess {string=Successfully,InternalError,RequestParamInvalid,Authorization,NotFound,PermissionDenied} msg
 * @apiSuccess {string} data                nothing.
 * @apiSampleRequest http://127.0.0.1:8066/post/posts/:id
 */
#[tracing::instrument(skip_all,fields(trace_id = common::log::generate_trace_id()))]
#[delete("/post/posts/{id}")]
async fn delete_post(
    req: HttpRequest,
    ctx: web::Data<AppContext>,
    post_id: web::Path<Uuid>,
) -> impl Responder {
    gen_extra_respond(handlers::post::delete_req(req, &ctx, post_id.into_inner()).await)
}

/**
 * @api {get} /post/posts/:id/comments 帖子的评论树
 * @apiVersion 0.0.1
 * @apiName ListComments
 * @apiGroup Post
 * @apiHeader {String} [Authorization]  user's access token
 * @apiParam {String} id   post id
 * @apiExample {curl} Example usage:
 *   curl -X GET http://127.0.0.1:8066/post/posts/67e55044-10b1-426f-9247-bb680e5fe0c8/comments
 * @apiSuccess {string=0,1,2,3,5,3001} status_code         status code.
 * @apiSuccess {string=Successfully,InternalError,RequestParamInvalid,Authorization,NotFound} msg
 * @apiSuccess {object[]} data                top-level comments, each with nested replies.
 * @apiSampleRequest http://127.0.0.1:8066/post/posts/:id/comments
 */
#[tracing::instrument(skip_all,fields(trace_id = common::log::generate_trace_id()))]
#[get("/post/posts/{id}/comments")]
async fn list_comments(
    req: HttpRequest,
    ctx: web::Data<AppContext>,
    post_id: web::Path<Uuid>,
) -> impl Responder {
    gen_extra_respond(handlers::comment::list_req(req, &ctx, post_id.into_inner()).await)
}

/**
 * @api {post} /post/posts/:id/comments/create 评论或回复
 * @apiVersion 0.0.1
 * @apiName CreateComment
 * @apiGroup Post
 * @apiHeader {String} Authorization  user's access token
 * @apiParam {String} id   post id
 * @apiBody {String} comment    up to 2000 characters
 * @apiBody {String} [parent]   id of the replied comment, must be on the same post
 * @apiExample {curl} Example usage:
 *   curl -X POST http://127.0.0.1:8066/post/posts/67e55044-10b1-426f-9247-bb680e5fe0c8/comments/create
 *   -H "Content-Type: application/json" -H "Authorization: Bearer eyJ0eXAiOiJKV1Q..." -d '{"comment":"nice"}'
 * @apiSuccess {string=0,1,2,3,5,3001} status_code         status code.
 * @apiSuccess {string=Successfully,InternalError,RequestParamInvalid,Authorization,NotFound} msg
 * @apiSuccess {object} data                the new comment.
 * @apiSampleRequest http://127.0.0.1:8066/post/posts/:id/comments/create
 */
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct CreateCommentRequest {
    pub comment: String,
    pub parent: Option<Uuid>,
}
#[tracing::instrument(skip_all,fields(trace_id = common::log::generate_trace_id()))]
#[post("/post/posts/{id}/comments/create")]
async fn create_comment(
    req: HttpRequest,
    ctx: web::Data<AppContext>,
    post_id: web::Path<Uuid>,
    request_data: web::Json<CreateCommentRequest>,
) -> impl Responder {
    debug!("{:?}", request_data.0);
    gen_extra_respond(
        handlers::comment::create_req(req, &ctx, post_id.into_inner(), request_data.into_inner())
            .await,
    )
}

/**
 * @api {get} /post/comments/:id 单条评论及其回复
 * @apiVersion 0.0.1
 * @apiName CommentDetail
 * @apiGroup Post
 * @apiHeader {String} [Authorization]  user's access token
 * @apiParam {String} id   comment id
 * @apiExample {curl} Example usage:
 *   curl -X GET http://127.0.0.1:8066/post/comments/67e55044-10b1-426f-9247-bb680e5fe0c8
 * @apiSuccess {string=0,1,2,3,5,3001} status_code         status code.
 * @apiSuccess {string=Successfully,InternalError,RequestParamInvalid,Authorization,NotFound} msg
 * @apiSuccess {object} data                comment with nested replies.
 * @apiSampleRequest http://127.0.0.1:8066/post/comments/:id
 */
#[tracing::instrument(skip_all,fields(trace_id = common::log::generate_trace_id()))]
#[get("/post/comments/{id}")]
async fn comment_detail(
    req: HttpRequest,
    ctx: web::Data<AppContext>,
    comment_id: web::Path<Uuid>,
) -> impl Responder {
    gen_extra_respond(handlers::comment::detail_req(req, &ctx, comment_id.into_inner()).await)
}

/**
 * @api {delete} /post/comments/:id 删除评论及其回复，仅作者
 * @apiVersion 0.0.1
 * @apiName DeleteComment
 * @apiGroup Post
 * @apiHeader {String} Authorization  author's access token
 * @apiParam {String} id   comment id
 * @apiExample {curl} Example usage:
 *   curl -X DELETE http://127.0.0.1:8066/post/comments/67e55044-10b1-426f-9247-bb680e5fe0c8
 *   -H "Authorization: Bearer eyJ0eXAiOiJKV1Q..."
 * @apiSuccess {string=0,1,2,3,5,3001,3002} status_code         status code.
 * @apiSuccess {string=Successfully,InternalError,RequestParamInvalid,Authorization,NotFound,PermissionDenied} msg
 * @apiSuccess {string} data                nothing.
 * @apiSampleRequest http://127.0.0.1:8066/post/comments/:id
 */
#[tracing::instrument(skip_all,fields(trace_id = common::log::generate_trace_id()))]
#[delete("/post/comments/{id}")]
async fn delete_comment(
    req: HttpRequest,
    ctx: web::Data<AppContext>,
    comment_id: web::Path<Uuid>,
) -> impl Responder {
    gen_extra_respond(handlers::comment::delete_req(req, &ctx, comment_id.into_inner()).await)
}

/**
 * @api {get} /post/posts/:id/likes 帖子的点赞列表
 * @apiVersion 0.0.1
 * @apiName ListPostLikes
 * @apiGroup Post
 * @apiParam {String} id   post id
 * @apiQuery {Number} [page=1]         page number
 * @apiQuery {Number} [page_size=10]   at most 100
 * @apiExample {curl} Example usage:
 *   curl -X GET "http://127.0.0.1:8066/post/posts/67e55044-10b1-426f-9247-bb680e5fe0c8/likes?page=1"
 * @apiSuccess {string=0,1,2,3,3001} status_code         status code.
 * @apiSuccess {string=Successfully,InternalError,RequestParamInvalid,NotFound} msg
 * @apiSuccess {object} data                {count, page, page_size, results}.
 * @apiSampleRequest http://127.0.0.1:8066/post/posts/:id/likes
 */
#[tracing::instrument(skip_all,fields(trace_id = common::log::generate_trace_id()))]
#[get("/post/posts/{id}/likes")]
async fn list_post_likes(
    ctx: web::Data<AppContext>,
    post_id: web::Path<Uuid>,
    query: web::Query<PageQuery>,
) -> impl Responder {
    gen_extra_respond(
        handlers::like::post_likes_req(&ctx, post_id.into_inner(), query.into_inner()).await,
    )
}

/**
 * @api {post} /post/posts/:id/likes/create 点赞帖子，重复点赞无副作用
 * @apiVersion 0.0.1
 * @apiName LikePost
 * @apiGroup Post
 * @apiHeader {String} Authorization  user's access token
 * @apiParam {String} id   post id
 * @apiExample {curl} Example usage:
 *   curl -X POST http://127.0.0.1:8066/post/posts/67e55044-10b1-426f-9247-bb680e5fe0c8/likes/create
 *   -H "Authorization: Bearer eyJ0eXAiOiJKV1Q..."
 * @apiSuccess {string=0,1,2,3,5,3001} status_code         status code.
 * @apiSuccess {string=Successfully,InternalError,RequestParamInvalid,Authorization,NotFound} msg
 * @apiSuccess {object} data                {created, like}.
 * @apiSampleRequest http://127.0.0.1:8066/post/posts/:id/likes/create
 */
#[tracing::instrument(skip_all,fields(trace_id = common::log::generate_trace_id()))]
#[post("/post/posts/{id}/likes/create")]
async fn like_post(
    req: HttpRequest,
    ctx: web::Data<AppContext>,
    post_id: web::Path<Uuid>,
) -> impl Responder {
    gen_extra_respond(handlers::like::like_post_req(req, &ctx, post_id.into_inner()).await)
}

/**
 * @api {delete} /post/posts/likes/:id 取消帖子点赞
 * @apiVersion 0.0.1
 * @apiName UnlikePost
 * @apiGroup Post
 * @apiHeader {String} Authorization  liker's access token
 * @apiParam {String} id   like id
 * @apiExample {curl} Example usage:
 *   curl -X DELETE http://127.0.0.1:8066/post/posts/likes/67e55044-10b1-426f-9247-bb680e5fe0c8
 *   -H "Authorization: Bearer eyJ0eXAiOiJKV1Q..."
 * @apiSuccess {string=0,1,2,3,5,3001,3002} status_code         status code.
 * @apiSuccess {string=Successfully,InternalError,RequestParamInvalid,Authorization,NotFound,PermissionDenied} msg
 * @apiSuccess {string} data                nothing.
 * @apiSampleRequest http://127.0.0.1:8066/post/posts/likes/:id
 */
#[tracing::instrument(skip_all,fields(trace_id = common::log::generate_trace_id()))]
#[delete("/post/posts/likes/{id}")]
async fn unlike_post(
    req: HttpRequest,
    ctx: web::Data<AppContext>,
    like_id: web::Path<Uuid>,
) -> impl Responder {
    gen_extra_respond(handlers::like::unlike_post_req(req, &ctx, like_id.into_inner()).await)
}

/**
 * @api {get} /post/comments/:id/likes 评论的点赞列表
 * @apiVersion 0.0.1
 * @apiName ListCommentLikes
 * @apiGroup Post
 * @apiParam {String} id   comment id
 * @apiQuery {Number} [page=1]         page number
 * @apiQuery {Number} [page_size=10]   at most 100
 * @apiExample {curl} Example usage:
 *   curl -X GET "http://127.0.0.1:8066/post/comments/67e55044-10b1-426f-9247-bb680e5fe0c8/likes"
 * @apiSuccess {string=0,1,2,3,3001} status_code         status code.
 * @apiSuccess {string=Successfully,InternalError,RequestParamInvalid,NotFound} msg
 * @apiSuccess {object} data                {count, page, page_size, results}.
 * @apiSampleRequest http://127.0.0.1:8066/post/comments/:id/likes
 */
#[tracing::instrument(skip_all,fields(trace_id = common::log::generate_trace_id()))]
#[get("/post/comments/{id}/likes")]
async fn list_comment_likes(
    ctx: web::Data<AppContext>,
    comment_id: web::Path<Uuid>,
    query: web::Query<PageQuery>,
) -> impl Responder {
    gen_extra_respond(
        handlers::like::comment_likes_req(&ctx, comment_id.into_inner(), query.into_inner()).await,
    )
}

/**
 * @api {post} /post/comments/:id/likes/create 点赞评论，重复点赞无副作用
 * @apiVersion 0.0.1
 * @apiName LikeComment
 * @apiGroup Post
 * @apiHeader {String} Authorization  user's access token
 * @apiParam {String} id   comment id
 * @apiExample {curl} Example usage:
 *   curl -X POST http://127.0.0.1:8066/post/comments/67e55044-10b1-426f-9247-bb680e5fe0c8/likes/create
 *   -H "Authorization: Bearer eyJ0eXAiOiJKV1Q..."
 * @apiSuccess {string=0,1,2,3,5,3001} status_code         status code.
 * @apiSuccess {string=Successfully,InternalError,RequestParamInvalid,Authorization,NotFound} msg
 * @apiSuccess {object} data                {created, like}.
 * @apiSampleRequest http://127.0.0.1:8066/post/comments/:id/likes/create
 */
#[tracing::instrument(skip_all,fields(trace_id = common::log::generate_trace_id()))]
#[post("/post/comments/{id}/likes/create")]
async fn like_comment(
    req: HttpRequest,
    ctx: web::Data<AppContext>,
    comment_id: web::Path<Uuid>,
) -> impl Responder {
    gen_extra_respond(handlers::like::like_comment_req(req, &ctx, comment_id.into_inner()).await)
}

/**
 * @api {delete} /post/comments/likes/:id 取消评论点赞
 * @apiVersion 0.0.1
 * @apiName UnlikeComment
 * @apiGroup Post
 * @apiHeader {String} Authorization  liker's access token
 * @apiParam {String} id   like id
 * @apiExample {curl} Example usage:
 *   curl -X DELETE http://127.0.0.1:8066/post/comments/likes/67e55044-10b1-426f-9247-bb680e5fe0c8
 *   -H "Authorization: Bearer eyJ0eXAiOiJKV1Q..."
 * @apiSuccess {string=0,1,2,3,5,3001,3002} status_code         status code.
 * @apiSuccess {string=Successfully,InternalError,RequestParamInvalid,Authorization,NotFound,PermissionDenied} msg
 * @apiSuccess {string} data                nothing.
 * @apiSampleRequest http://127.0.0.1:8066/post/comments/likes/:id
 */
#[tracing::instrument(skip_all,fields(trace_id = common::log::generate_trace_id()))]
#[delete("/post/comments/likes/{id}")]
async fn unlike_comment(
    req: HttpRequest,
    ctx: web::Data<AppContext>,
    like_id: web::Path<Uuid>,
) -> impl Responder {
    gen_extra_respond(handlers::like::unlike_comment_req(req, &ctx, like_id.into_inner()).await)
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list_posts)
        .service(create_post)
        .service(unlike_post)
        .service(unlike_comment)
        .service(post_detail)
        .service(update_post)
        .service(delete_post)
        .service(list_comments)
        .service(create_comment)
        .service(comment_detail)
        .service(delete_comment)
        .service(list_post_likes)
        .service(like_post)
        .service(list_comment_likes)
        .service(like_comment);
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use crate::test_service_call;
    use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
    use actix_web::http::header;
    use actix_web::{test, App, Error};

    use crate::post::handlers::comment::CommentNode;
    use crate::post::handlers::like::{LikeResponse, LikeView};
    use crate::post::handlers::post::PostView;
    use crate::post::handlers::PageResponse;
    use crate::utils::api_test::{create_done_user, test_context, MutableClock};
    use crate::utils::respond::{configure_extractors, BackendRespond};

    fn init(
        ctx: AppContext,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse,
            Error = Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(web::Data::new(ctx))
            .configure(configure_extractors)
            .configure(configure_routes)
    }

    #[actix_web::test]
    async fn test_post_lifecycle() {
        let clock = Arc::new(MutableClock::default());
        let ctx = test_context(clock.clone());
        let service = test::init_service(init(ctx.clone())).await;
        let (author, author_pair) = create_done_user(&ctx, "author", "auth0r-secret").await;
        let (_other, other_pair) = create_done_user(&ctx, "other", "0ther-secret").await;

        let payload = r#"{ "media": "uploads/clip.exe", "caption": "bad" }"#;
        let res: BackendRespond<PostView> = test_service_call!(
            service,
            "post",
            "/post/posts/create",
            Some(payload),
            Some(&author_pair.access)
        );
        assert_eq!(res.status_code, 2);

        let mut post_ids = vec![];
        for (media, caption) in [("uploads/a.jpg", "first"), ("uploads/b.mp4", "second")] {
            clock.advance_millis(1000);
            let payload = format!(r#"{{ "media": "{}", "caption": "{}" }}"#, media, caption);
            let res: BackendRespond<PostView> = test_service_call!(
                service,
                "post",
                "/post/posts/create",
                Some(payload),
                Some(&author_pair.access)
            );
            assert_eq!(res.status_code, 0);
            let post = res.data.unwrap();
            assert_eq!(post.author_id, author.id);
            post_ids.push(post.id);
        }

        //anonymous listing, newest first
        let res: BackendRespond<PageResponse<PostView>> = test_service_call!(
            service,
            "get",
            "/post/posts?page=1&page_size=1",
            None::<&str>,
            None::<String>
        );
        let page = res.data.unwrap();
        assert_eq!(page.count, 2);
        assert_eq!(page.results.len(), 1);
        assert_eq!(page.results[0].caption, "second");

        let res: BackendRespond<PageResponse<PostView>> = test_service_call!(
            service,
            "get",
            "/post/posts?page=0",
            None::<&str>,
            None::<String>
        );
        assert_eq!(res.status_code, 2);

        let res: BackendRespond<PageResponse<PostView>> = test_service_call!(
            service,
            "get",
            "/post/posts?page=18446744073709551615&page_size=10",
            None::<&str>,
            None::<String>
        );
        assert_eq!(res.status_code, 2);

        let uri = format!("/post/posts/{}", post_ids[0]);
        let payload = r#"{ "caption": "edited" }"#;
        let res: BackendRespond<PostView> = test_service_call!(
            service,
            "put",
            &uri,
            Some(payload),
            Some(&other_pair.access)
        );
        assert_eq!(res.status_code, 3002);

        let res: BackendRespond<PostView> = test_service_call!(
            service,
            "put",
            &uri,
            Some(payload),
            Some(&author_pair.access)
        );
        assert_eq!(res.status_code, 0);
        let post = res.data.unwrap();
        assert_eq!(post.caption, "edited");
        assert_eq!(post.media, "uploads/a.jpg");

        let res: BackendRespond<String> =
            test_service_call!(service, "delete", &uri, None::<&str>, Some(&other_pair.access));
        assert_eq!(res.status_code, 3002);
        let res: BackendRespond<String> =
            test_service_call!(service, "delete", &uri, None::<&str>, Some(&author_pair.access));
        assert_eq!(res.status_code, 0);
        let res: BackendRespond<PostView> =
            test_service_call!(service, "get", &uri, None::<&str>, None::<String>);
        assert_eq!(res.status_code, 3001);

        //a bad token is rejected even where auth is optional
        let res: BackendRespond<PageResponse<PostView>> = test_service_call!(
            service,
            "get",
            "/post/posts",
            None::<&str>,
            Some("not-a-token")
        );
        assert_eq!(res.status_code, 5);
    }

    #[actix_web::test]
    async fn test_comment_tree_and_cascade() {
        let ctx = test_context(Arc::new(MutableClock::default()));
        let service = test::init_service(init(ctx.clone())).await;
        let (_author, pair) = create_done_user(&ctx, "commenter", "c0mment-secret").await;
        let (_other, other_pair) = create_done_user(&ctx, "stranger", "str4nger-secret").await;

        let mut post_ids = vec![];
        for media in ["uploads/one.png", "uploads/two.png"] {
            let payload = format!(r#"{{ "media": "{}", "caption": "" }}"#, media);
            let res: BackendRespond<PostView> = test_service_call!(
                service,
                "post",
                "/post/posts/create",
                Some(payload),
                Some(&pair.access)
            );
            post_ids.push(res.data.unwrap().id);
        }

        let create_uri = format!("/post/posts/{}/comments/create", post_ids[0]);
        let res: BackendRespond<CommentNode> = test_service_call!(
            service,
            "post",
            &create_uri,
            Some(r#"{ "comment": "top" }"#),
            Some(&pair.access)
        );
        let top = res.data.unwrap();
        assert_eq!(top.parent_id, None);

        let payload = format!(r#"{{ "comment": "reply", "parent": "{}" }}"#, top.id);
        let res: BackendRespond<CommentNode> = test_service_call!(
            service,
            "post",
            &create_uri,
            Some(payload),
            Some(&other_pair.access)
        );
        let reply = res.data.unwrap();
        assert_eq!(reply.parent_id, Some(top.id));

        //parent on another post
        let other_uri = format!("/post/posts/{}/comments/create", post_ids[1]);
        let payload = format!(r#"{{ "comment": "lost", "parent": "{}" }}"#, top.id);
        let res: BackendRespond<CommentNode> = test_service_call!(
            service,
            "post",
            &other_uri,
            Some(payload),
            Some(&pair.access)
        );
        assert_eq!(res.status_code, 2);

        let like_uri = format!("/post/comments/{}/likes/create", reply.id);
        let res: BackendRespond<LikeResponse> =
            test_service_call!(service, "post", &like_uri, None::<&str>, Some(&pair.access));
        assert!(res.data.unwrap().created);

        let uri = format!("/post/posts/{}/comments", post_ids[0]);
        let res: BackendRespond<Vec<CommentNode>> =
            test_service_call!(service, "get", &uri, None::<&str>, Some(&pair.access));
        let tree = res.data.unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].replies.len(), 1);
        assert_eq!(tree[0].replies[0].comment, "reply");
        assert_eq!(tree[0].replies[0].likes_count, 1);
        assert!(tree[0].replies[0].request_user_liked);

        let uri = format!("/post/comments/{}", reply.id);
        let res: BackendRespond<CommentNode> =
            test_service_call!(service, "get", &uri, None::<&str>, None::<String>);
        let detail = res.data.unwrap();
        assert_eq!(detail.id, reply.id);
        assert!(!detail.request_user_liked);

        let uri = format!("/post/comments/{}", top.id);
        let res: BackendRespond<String> =
            test_service_call!(service, "delete", &uri, None::<&str>, Some(&other_pair.access));
        assert_eq!(res.status_code, 3002);
        let res: BackendRespond<String> =
            test_service_call!(service, "delete", &uri, None::<&str>, Some(&pair.access));
        assert_eq!(res.status_code, 0);

        //replies went with their parent
        let uri = format!("/post/comments/{}", reply.id);
        let res: BackendRespond<CommentNode> =
            test_service_call!(service, "get", &uri, None::<&str>, None::<String>);
        assert_eq!(res.status_code, 3001);
        let uri = format!("/post/comments/{}/likes", reply.id);
        let res: BackendRespond<PageResponse<LikeView>> =
            test_service_call!(service, "get", &uri, None::<&str>, None::<String>);
        assert_eq!(res.status_code, 3001);
    }

    #[actix_web::test]
    async fn test_like_is_idempotent() {
        let ctx = test_context(Arc::new(MutableClock::default()));
        let service = test::init_service(init(ctx.clone())).await;
        let (_author, pair) = create_done_user(&ctx, "liker", "l1ker-secret").await;
        let (_other, other_pair) = create_done_user(&ctx, "watcher", "w4tcher-secret").await;

        let payload = r#"{ "media": "uploads/cat.heic", "caption": "cat" }"#;
        let res: BackendRespond<PostView> = test_service_call!(
            service,
            "post",
            "/post/posts/create",
            Some(payload),
            Some(&pair.access)
        );
        let post_id = res.data.unwrap().id;

        let like_uri = format!("/post/posts/{}/likes/create", post_id);
        let res: BackendRespond<LikeResponse> =
            test_service_call!(service, "post", &like_uri, None::<&str>, Some(&pair.access));
        let first = res.data.unwrap();
        assert!(first.created);
        let res: BackendRespond<LikeResponse> =
            test_service_call!(service, "post", &like_uri, None::<&str>, Some(&pair.access));
        let second = res.data.unwrap();
        assert!(!second.created);
        assert_eq!(second.like.id, first.like.id);

        let uri = format!("/post/posts/{}", post_id);
        let res: BackendRespond<PostView> =
            test_service_call!(service, "get", &uri, None::<&str>, Some(&pair.access));
        let post = res.data.unwrap();
        assert_eq!(post.likes_count, 1);
        assert!(post.request_user_liked);
        let res: BackendRespond<PostView> =
            test_service_call!(service, "get", &uri, None::<&str>, None::<String>);
        assert!(!res.data.unwrap().request_user_liked);

        let uri = format!("/post/posts/{}/likes", post_id);
        let res: BackendRespond<PageResponse<LikeView>> =
            test_service_call!(service, "get", &uri, None::<&str>, None::<String>);
        let likes = res.data.unwrap();
        assert_eq!(likes.count, 1);
        assert_eq!(likes.results[0].target_id, post_id);

        let unlike_uri = format!("/post/posts/likes/{}", first.like.id);
        let res: BackendRespond<String> = test_service_call!(
            service,
            "delete",
            &unlike_uri,
            None::<&str>,
            Some(&other_pair.access)
        );
        assert_eq!(res.status_code, 3002);
        let res: BackendRespond<String> =
            test_service_call!(service, "delete", &unlike_uri, None::<&str>, Some(&pair.access));
        assert_eq!(res.status_code, 0);
        let res: BackendRespond<String> =
            test_service_call!(service, "delete", &unlike_uri, None::<&str>, Some(&pair.access));
        assert_eq!(res.status_code, 3001);
    }
}
