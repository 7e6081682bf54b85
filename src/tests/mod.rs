mod body_test;
mod middleware_test;
mod ws_test;
