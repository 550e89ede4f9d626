pub use timestamp::*;
pub use user::*;
pub use video::*;

mod timestamp;
mod user;
mod video;

use crate::prelude::*;

define_table!("videos": Video = id);
define_table!("users": User = id);

define_model!(Video);

define_relation! {
    Video > all_recent() > Vec<Video>
        where "SELECT * FROM videos ORDER BY upload_time DESC"
}

define_relation! {
    Video > search(q: String) > Vec<Video>
        where "SELECT * FROM videos WHERE string::contains(string::lowercase(title), string::lowercase($q)) ORDER BY upload_time DESC"
}

// One UPDATE statement per watch request: the increment is atomic on the
// record, concurrent watches cannot lose counts.
define_relation! {
    Video > watch(suffix: String) > Option<Video>
        where "UPDATE videos SET views += 1 WHERE string::endsWith(video_url, $suffix) RETURN AFTER"
}

define_relation! {
    User > find_staff(username: String, password: String) > Only<User>
        where "SELECT * FROM users WHERE is_staff = true AND username = $username AND crypto::argon2::compare(password, $password) LIMIT 1"
}

define_relation! {
    User > by_username(username: String) > Option<User>
        where "SELECT * FROM users WHERE username = $username LIMIT 1"
}

define_relation! {
    User > create_staff(username: String, password: String, created_at: Timestamp) > Only<User>
        where "CREATE users SET username = $username, password = crypto::argon2::generate($password), is_staff = true, created_at = $created_at RETURN *"
}
