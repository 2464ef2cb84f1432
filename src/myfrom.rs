use std::borrow::Cow;

use kstring::KString;

/// The string types names are accepted as, everywhere a name is
/// taken.
pub trait MyFrom<T> {
    fn myfrom(s: T) -> Self;
}

impl MyFrom<&str> for KString {
    fn myfrom(s: &str) -> Self {
        KString::from_ref(s)
    }
}

impl MyFrom<&&str> for KString {
    fn myfrom(s: &&str) -> Self {
        KString::from_ref(*s)
    }
}

impl MyFrom<&String> for KString {
    fn myfrom(s: &String) -> Self {
        KString::from_ref(s)
    }
}

impl MyFrom<String> for KString {
    fn myfrom(s: String) -> Self {
        KString::from_string(s)
    }
}

impl MyFrom<&KString> for KString {
    fn myfrom(s: &KString) -> Self {
        s.clone()
    }
}

impl MyFrom<KString> for KString {
    fn myfrom(s: KString) -> Self {
        s
    }
}

impl<'t> MyFrom<Cow<'t, str>> for KString {
    fn myfrom(s: Cow<'t, str>) -> Self {
        match s {
            Cow::Borrowed(s) => KString::from_ref(s),
            Cow::Owned(s) => KString::from_string(s),
        }
    }
}

pub fn ks<T>(s: T) -> KString
where KString: MyFrom<T>
{
    KString::myfrom(s)
}
